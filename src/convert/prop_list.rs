//! Property eligibility from `prop-list` patterns.
//!
//! Supported entries:
//! - `*` or `""` matches every property
//! - `name` matches exactly
//! - `prefix*`, `*suffix`, `*fragment*` match by prefix, suffix or substring
//! - any of the above prefixed with `!` excludes instead of includes
//!
//! A property is convertible when some inclusion matches and no exclusion
//! does, whatever their order in the list.

#[derive(Debug, Clone, PartialEq, Eq)]
enum PropPattern {
	Any,
	Exact(String),
	Prefix(String),
	Suffix(String),
	Contains(String),
}

impl PropPattern {
	fn parse(body: &str) -> Self {
		if body.is_empty() || body == "*" {
			return PropPattern::Any;
		}

		let starts = body.starts_with('*');
		let ends = body.ends_with('*') && body.len() > 1;

		match (starts, ends) {
			(true, true) => PropPattern::Contains(body[1..body.len() - 1].to_string()),
			(true, false) => PropPattern::Suffix(body[1..].to_string()),
			(false, true) => PropPattern::Prefix(body[..body.len() - 1].to_string()),
			(false, false) => PropPattern::Exact(body.to_string()),
		}
	}

	fn matches(&self, property: &str) -> bool {
		match self {
			PropPattern::Any => true,
			PropPattern::Exact(name) => property == name,
			PropPattern::Prefix(prefix) => property.starts_with(prefix.as_str()),
			PropPattern::Suffix(suffix) => property.ends_with(suffix.as_str()),
			PropPattern::Contains(fragment) => property.contains(fragment.as_str()),
		}
	}
}

/// Compiled `prop-list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropList {
	include: Vec<PropPattern>,
	exclude: Vec<PropPattern>,
}

impl PropList {
	pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
		let mut include = Vec::new();
		let mut exclude = Vec::new();

		for entry in entries {
			let entry = entry.as_ref().trim();
			match entry.strip_prefix('!') {
				Some(negated) => exclude.push(PropPattern::parse(negated)),
				None => include.push(PropPattern::parse(entry)),
			}
		}

		PropList { include, exclude }
	}

	pub fn is_convertible(&self, property: &str) -> bool {
		self.include.iter().any(|p| p.matches(property))
			&& !self.exclude.iter().any(|p| p.matches(property))
	}
}

impl Default for PropList {
	fn default() -> Self {
		PropList::new(&["*"])
	}
}
