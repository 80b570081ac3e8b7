//! Pixel to viewport-unit conversion.
//!
//! This module handles:
//! - File, selector, property and media-query gating
//! - Per-property override rules
//! - Value rewriting with fixed precision and thresholds
//! - Replacing declarations in place or appending converted copies

pub mod matcher;
pub mod media;
pub mod overrides;
pub mod prop_list;
pub mod rewriter;
pub mod value;

pub use matcher::{FileFilter, Matcher, SelectorFilter};
pub use media::{MediaKind, MediaQueryFilter, RuleContext};
pub use overrides::{OverrideRule, Overrides};
pub use prop_list::PropList;
pub use rewriter::{ConversionResult, Report, Warning};
pub use value::{Target, ValueMatcher};

use crate::config::Options;
use crate::error::Result;
use std::path::Path;

/// Compiled, read-only conversion settings.
///
/// Build once per run; it holds no per-file state, so one instance can be
/// shared across threads processing different files.
#[derive(Debug, Clone)]
pub struct Converter {
	files: FileFilter,
	selectors: SelectorFilter,
	props: PropList,
	media: MediaQueryFilter,
	overrides: Overrides,
	values: ValueMatcher,
	portrait: Target,
	font: Target,
	landscape: Option<Target>,
	replace: bool,
}

impl Converter {
	/// Validate options and compile every pattern they contain.
	pub fn new(options: &Options) -> Result<Self> {
		options.validate()?;

		let divisor_for = |unit: &str| match options.viewport_height {
			Some(height) if unit.eq_ignore_ascii_case("vh") => height,
			_ => options.viewport_width,
		};

		Ok(Converter {
			files: FileFilter::new(options.include.as_deref(), options.exclude.as_deref())?,
			selectors: SelectorFilter::new(&options.selector_black_list)?,
			props: PropList::new(options.prop_list.as_slice()),
			media: MediaQueryFilter::new(&options.media_query)?,
			overrides: Overrides::new(&options.rules)?,
			values: ValueMatcher::new(
				&options.unit_to_convert,
				options.unit_precision,
				options.min_pixel_value,
			)?,
			portrait: Target::new(
				divisor_for(&options.viewport_unit),
				&options.viewport_unit,
			),
			font: Target::new(
				divisor_for(&options.font_viewport_unit),
				&options.font_viewport_unit,
			),
			landscape: options
				.landscape
				.then(|| Target::new(options.landscape_width, &options.landscape_unit)),
			replace: options.replace,
		})
	}

	/// Whether a file at `path` takes part in conversion.
	pub fn accepts_file(&self, path: &Path) -> bool {
		self.files.accepts(path)
	}
}
