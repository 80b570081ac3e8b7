use crate::config::{RuleSpec, Transform};
use crate::convert::matcher::Matcher;
use crate::error::{Result, TransformError};

/// A compiled override rule.
#[derive(Debug, Clone)]
pub struct OverrideRule {
	/// Compared against the property name.
	pub test: Matcher,

	/// Optional selector constraint.
	pub selector: Option<Matcher>,

	pub transform: Transform,
}

impl OverrideRule {
	pub fn from_spec(spec: &RuleSpec) -> Result<Self> {
		Ok(OverrideRule {
			test: Matcher::compile(&spec.test)?,
			selector: spec.selector.as_ref().map(Matcher::compile).transpose()?,
			transform: spec.transform.clone(),
		})
	}

	pub fn matches(&self, selector: &str, property: &str) -> bool {
		if !self.test.matches_exact(property) {
			return false;
		}

		match self.selector {
			Some(ref matcher) => matcher.matches(selector),
			None => true,
		}
	}

	/// Produce the replacement text for one pixel token.
	pub fn apply(
		&self,
		pixels: f64,
		converted: f64,
		property: &str,
	) -> std::result::Result<String, TransformError> {
		match &self.transform {
			Transform::Template(template) => Ok(template
				.replace("{pixels}", &pixels.to_string())
				.replace("{value}", &converted.to_string())
				.replace("{prop}", property)),
			Transform::Custom(f) => f(pixels, converted, property),
		}
	}
}

/// Ordered override table; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	rules: Vec<OverrideRule>,
}

impl Overrides {
	pub fn new(specs: &[RuleSpec]) -> Result<Self> {
		let rules = specs
			.iter()
			.map(OverrideRule::from_spec)
			.collect::<Result<Vec<_>>>()?;
		Ok(Overrides { rules })
	}

	pub fn resolve(&self, selector: &str, property: &str) -> Option<&OverrideRule> {
		self.rules.iter().find(|rule| rule.matches(selector, property))
	}
}
