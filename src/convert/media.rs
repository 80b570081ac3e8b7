use crate::config::MediaQuery;
use crate::convert::matcher::{Matcher, compile_all};
use crate::error::Result;

/// Condition of the synthesized landscape block.
pub const LANDSCAPE_PARAMS: &str = "(orientation: landscape)";

/// Where a rule sits relative to at-rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleContext<'a> {
	/// Not nested in any at-rule.
	TopLevel,
	/// Nested only in non-media at-rules (`@supports`, `@keyframes`, ...).
	Nested,
	/// Nested in a media block; carries the nearest media condition.
	Media(&'a str),
}

/// Classification of a media condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
	/// The condition already targets landscape orientation.
	Landscape,
	/// Any other condition.
	Plain,
}

/// Classify a media condition string.
pub fn classify(params: &str) -> MediaKind {
	if params.to_ascii_lowercase().contains("landscape") {
		MediaKind::Landscape
	} else {
		MediaKind::Plain
	}
}

/// Gate for rules nested inside media blocks.
#[derive(Debug, Clone, Default)]
pub enum MediaQueryFilter {
	#[default]
	Disabled,
	All,
	Matching(Vec<Matcher>),
}

impl MediaQueryFilter {
	pub fn new(option: &MediaQuery) -> Result<Self> {
		Ok(match option {
			MediaQuery::Enabled(false) => MediaQueryFilter::Disabled,
			MediaQuery::Enabled(true) => MediaQueryFilter::All,
			MediaQuery::Matching(patterns) => {
				MediaQueryFilter::Matching(compile_all(patterns.as_slice())?)
			}
		})
	}

	/// Whether declarations in this context may be converted.
	pub fn allows(&self, context: RuleContext<'_>) -> bool {
		match context {
			RuleContext::TopLevel | RuleContext::Nested => true,
			RuleContext::Media(params) => match self {
				MediaQueryFilter::Disabled => false,
				MediaQueryFilter::All => true,
				MediaQueryFilter::Matching(matchers) => matchers.iter().any(|m| m.matches(params)),
			},
		}
	}
}
