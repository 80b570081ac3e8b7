use crate::error::{Px2VwError, Result, TransformError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Highest accepted `unit-precision`; f64 carries no more useful digits.
pub const MAX_UNIT_PRECISION: i32 = 20;

/// Conversion options, as read from a `.px2vw.toml` file.
///
/// Every field has a default, so `Options::default()` (or an empty file) is
/// a complete configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Options {
	/// Source unit recognized in declaration values.
	pub unit_to_convert: String,

	/// Design width used as the divisor for portrait conversion.
	pub viewport_width: f64,

	/// Design height, used instead of the width when the target unit is `vh`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub viewport_height: Option<f64>,

	/// Decimal places kept after conversion.
	pub unit_precision: i32,

	/// Target unit for portrait conversion.
	pub viewport_unit: String,

	/// Target unit for properties whose name contains `font`.
	pub font_viewport_unit: String,

	/// Pixel values below this are left alone.
	pub min_pixel_value: f64,

	/// Property patterns deciding which declarations are eligible.
	pub prop_list: Vec<String>,

	/// Selectors exempted from conversion.
	pub selector_black_list: Vec<Pattern>,

	/// Overwrite values in place instead of appending a converted copy.
	pub replace: bool,

	/// Whether rules nested in `@media` blocks are converted.
	pub media_query: MediaQuery,

	/// Append an `@media (orientation: landscape)` block with duplicates.
	pub landscape: bool,

	/// Target unit used for landscape conversion.
	pub landscape_unit: String,

	/// Divisor used for landscape conversion.
	pub landscape_width: f64,

	/// If set, only files matching one of these patterns are converted.
	#[serde(
		deserialize_with = "deserialize_pattern_set",
		skip_serializing_if = "Option::is_none"
	)]
	pub include: Option<Vec<Pattern>>,

	/// Files matching any of these patterns are skipped.
	#[serde(
		deserialize_with = "deserialize_pattern_set",
		skip_serializing_if = "Option::is_none"
	)]
	pub exclude: Option<Vec<Pattern>>,

	/// Per-property overrides, first match wins.
	pub rules: Vec<RuleSpec>,
}

impl Default for Options {
	fn default() -> Self {
		Options {
			unit_to_convert: "px".to_string(),
			viewport_width: 320.0,
			viewport_height: None,
			unit_precision: 5,
			viewport_unit: "vw".to_string(),
			font_viewport_unit: "vw".to_string(),
			min_pixel_value: 1.0,
			prop_list: vec!["*".to_string()],
			selector_black_list: Vec::new(),
			replace: true,
			media_query: MediaQuery::default(),
			landscape: false,
			landscape_unit: "vw".to_string(),
			landscape_width: 568.0,
			include: None,
			exclude: None,
			rules: Vec::new(),
		}
	}
}

impl Options {
	/// Check every option against its documented domain.
	pub fn validate(&self) -> Result<()> {
		check_dimension("viewport-width", self.viewport_width)?;
		check_dimension("landscape-width", self.landscape_width)?;
		if let Some(height) = self.viewport_height {
			check_dimension("viewport-height", height)?;
		}

		if !(0..=MAX_UNIT_PRECISION).contains(&self.unit_precision) {
			return Err(invalid(
				"unit-precision",
				format!(
					"must be between 0 and {MAX_UNIT_PRECISION}, got {}",
					self.unit_precision
				),
			));
		}

		if !self.min_pixel_value.is_finite() || self.min_pixel_value < 0.0 {
			return Err(invalid(
				"min-pixel-value",
				format!("must be a non-negative number, got {}", self.min_pixel_value),
			));
		}

		let units = [
			("unit-to-convert", &self.unit_to_convert),
			("viewport-unit", &self.viewport_unit),
			("font-viewport-unit", &self.font_viewport_unit),
			("landscape-unit", &self.landscape_unit),
		];
		for (option, unit) in units {
			if unit.trim().is_empty() {
				return Err(invalid(option, "must not be empty".to_string()));
			}
		}

		Ok(())
	}
}

fn check_dimension(option: &str, value: f64) -> Result<()> {
	if value.is_finite() && value > 0.0 {
		Ok(())
	} else {
		Err(invalid(
			option,
			format!("must be a positive number, got {value}"),
		))
	}
}

fn invalid(option: &str, reason: String) -> Px2VwError {
	Px2VwError::InvalidOption {
		option: option.to_string(),
		reason,
	}
}

/// An uncompiled pattern: literal text or a regular expression source.
///
/// In TOML a plain string is a literal and `{ regex = "..." }` is a regex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
	Literal(String),
	Regex { regex: String },
}

impl Pattern {
	pub fn literal(text: impl Into<String>) -> Self {
		Pattern::Literal(text.into())
	}

	pub fn regex(source: impl Into<String>) -> Self {
		Pattern::Regex {
			regex: source.into(),
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
	Many(Vec<T>),
	One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
	fn from(value: OneOrMany<T>) -> Self {
		match value {
			OneOrMany::One(item) => vec![item],
			OneOrMany::Many(items) => items,
		}
	}
}

fn deserialize_pattern_set<'de, D>(
	deserializer: D,
) -> std::result::Result<Option<Vec<Pattern>>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = OneOrMany::<Pattern>::deserialize(deserializer)?;
	Ok(Some(value.into()))
}

/// Participation of rules nested in `@media` blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaQuery {
	/// `false` skips every media block, `true` converts all of them.
	Enabled(bool),
	/// Only media blocks whose condition matches one of the patterns.
	Matching(Vec<Pattern>),
}

impl Default for MediaQuery {
	fn default() -> Self {
		MediaQuery::Enabled(false)
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMediaQuery {
	Flag(bool),
	Many(Vec<Pattern>),
	One(Pattern),
}

impl<'de> Deserialize<'de> for MediaQuery {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(match RawMediaQuery::deserialize(deserializer)? {
			RawMediaQuery::Flag(enabled) => MediaQuery::Enabled(enabled),
			RawMediaQuery::One(pattern) => MediaQuery::Matching(vec![pattern]),
			RawMediaQuery::Many(patterns) => MediaQuery::Matching(patterns),
		})
	}
}

impl Serialize for MediaQuery {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			MediaQuery::Enabled(enabled) => serializer.serialize_bool(*enabled),
			MediaQuery::Matching(patterns) => patterns.serialize(serializer),
		}
	}
}

/// Signature of a custom transform: `(pixels, converted, property)`.
pub type TransformFn =
	dyn Fn(f64, f64, &str) -> std::result::Result<String, TransformError> + Send + Sync;

/// How an override rule produces its replacement text.
#[derive(Clone)]
pub enum Transform {
	/// Text with `{pixels}`, `{value}` and `{prop}` placeholders.
	Template(String),
	/// Arbitrary code registered through the library API.
	Custom(Arc<TransformFn>),
}

impl Transform {
	pub fn custom<F>(f: F) -> Self
	where
		F: Fn(f64, f64, &str) -> std::result::Result<String, TransformError>
			+ Send
			+ Sync
			+ 'static,
	{
		Transform::Custom(Arc::new(f))
	}
}

impl fmt::Debug for Transform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Transform::Template(template) => f.debug_tuple("Template").field(template).finish(),
			Transform::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

impl<'de> Deserialize<'de> for Transform {
	fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(Transform::Template)
	}
}

impl Serialize for Transform {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			Transform::Template(template) => serializer.serialize_str(template),
			Transform::Custom(_) => serializer.serialize_str("<custom>"),
		}
	}
}

/// One entry of the override table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
	/// Matched against the property name: literal equality or regex.
	pub test: Pattern,

	/// Optional selector constraint: literal substring or regex.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub selector: Option<Pattern>,

	/// Replacement for each qualifying pixel token.
	#[serde(rename = "value")]
	pub transform: Transform,
}

impl RuleSpec {
	pub fn new(test: Pattern, transform: Transform) -> Self {
		RuleSpec {
			test,
			selector: None,
			transform,
		}
	}

	pub fn with_selector(mut self, selector: Pattern) -> Self {
		self.selector = Some(selector);
		self
	}
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed options.
	pub options: Options,

	/// The path these options were loaded from.
	pub path: PathBuf,
}
