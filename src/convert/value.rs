use crate::convert::matcher::compile_regex;
use crate::convert::overrides::OverrideRule;
use crate::error::{Result, TransformError};
use regex::Regex;

/// Divisor and unit for one conversion direction (portrait or landscape).
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
	pub divisor: f64,
	pub unit: String,
}

impl Target {
	pub fn new(divisor: f64, unit: impl Into<String>) -> Self {
		Target {
			divisor,
			unit: unit.into(),
		}
	}
}

/// Finds source-unit lengths in a value and rewrites them.
#[derive(Debug, Clone)]
pub struct ValueMatcher {
	unit: String,
	regex: Regex,
	precision: i32,
	min_pixel_value: f64,
}

impl ValueMatcher {
	pub fn new(unit: &str, precision: i32, min_pixel_value: f64) -> Result<Self> {
		// Quoted strings and url() are matched first so their contents are skipped.
		let pattern = format!(
			r#""[^"]*"|'[^']*'|url\([^)]*\)|(\d*\.?\d+){}"#,
			regex::escape(unit)
		);

		Ok(ValueMatcher {
			unit: unit.to_string(),
			regex: compile_regex(&pattern)?,
			precision,
			min_pixel_value,
		})
	}

	/// Cheap pre-check before running the regex.
	pub fn mentions_unit(&self, value: &str) -> bool {
		value.contains(self.unit.as_str())
	}

	/// Rewrite every qualifying token in `value`.
	///
	/// With an override rule, its output replaces each token verbatim;
	/// otherwise the token becomes the rounded number plus `target.unit`.
	pub fn convert(
		&self,
		value: &str,
		target: &Target,
		override_rule: Option<&OverrideRule>,
		property: &str,
	) -> std::result::Result<String, TransformError> {
		let mut out = String::with_capacity(value.len());
		let mut last = 0;

		for caps in self.regex.captures_iter(value) {
			let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
				continue;
			};
			if !is_standalone(value, number.start(), whole.end()) {
				continue;
			}
			let Ok(pixels) = number.as_str().parse::<f64>() else {
				continue;
			};
			if pixels == 0.0 || pixels < self.min_pixel_value {
				continue;
			}

			let converted = round_to(pixels / target.divisor * 100.0, self.precision);
			let replacement = match override_rule {
				Some(rule) => rule.apply(pixels, converted, property)?,
				None => format_length(converted, &target.unit),
			};

			out.push_str(&value[last..whole.start()]);
			out.push_str(&replacement);
			last = whole.end();
		}

		out.push_str(&value[last..]);
		Ok(out)
	}
}

/// Reject numbers glued to an identifier on either side, e.g. `a10px` or `10pxs`.
fn is_standalone(value: &str, start: usize, end: usize) -> bool {
	let mut before = value[..start].chars().rev();
	match before.next() {
		Some(c) if is_word_char(c) => return false,
		Some('-') if before.next().is_some_and(is_word_char) => return false,
		_ => {}
	}

	!value[end..]
		.chars()
		.next()
		.is_some_and(|c| is_word_char(c) || c == '-')
}

fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

/// Round half away from zero at `precision` decimal places.
pub fn round_to(value: f64, precision: i32) -> f64 {
	let factor = 10f64.powi(precision);
	(value * factor).round() / factor
}

/// Shortest decimal form plus unit; zero stays unit-less.
pub fn format_length(value: f64, unit: &str) -> String {
	if value == 0.0 {
		"0".to_string()
	} else {
		format!("{value}{unit}")
	}
}
