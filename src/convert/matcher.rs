use crate::config::Pattern;
use crate::error::{Px2VwError, Result};
use regex::Regex;
use std::path::Path;

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
	Literal(String),
	Pattern(Regex),
}

impl Matcher {
	/// Compile an option pattern.
	pub fn compile(pattern: &Pattern) -> Result<Self> {
		match pattern {
			Pattern::Literal(text) => Ok(Matcher::Literal(text.clone())),
			Pattern::Regex { regex } => compile_regex(regex).map(Matcher::Pattern),
		}
	}

	/// Literal: `candidate` contains the text. Regex: the expression matches.
	pub fn matches(&self, candidate: &str) -> bool {
		match self {
			Matcher::Literal(text) => candidate.contains(text.as_str()),
			Matcher::Pattern(regex) => regex.is_match(candidate),
		}
	}

	/// Literal: `candidate` equals the text. Regex: the expression matches.
	pub fn matches_exact(&self, candidate: &str) -> bool {
		match self {
			Matcher::Literal(text) => candidate == text,
			Matcher::Pattern(regex) => regex.is_match(candidate),
		}
	}
}

/// Compile a regex pattern string.
pub fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| Px2VwError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

/// Compile a list of option patterns.
pub fn compile_all(patterns: &[Pattern]) -> Result<Vec<Matcher>> {
	patterns.iter().map(Matcher::compile).collect()
}

/// Decides whether a file takes part in conversion at all.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
	include: Option<Vec<Matcher>>,
	exclude: Option<Vec<Matcher>>,
}

impl FileFilter {
	pub fn new(include: Option<&[Pattern]>, exclude: Option<&[Pattern]>) -> Result<Self> {
		Ok(FileFilter {
			include: include.map(compile_all).transpose()?,
			exclude: exclude.map(compile_all).transpose()?,
		})
	}

	/// `include`, when set, is the only gate; otherwise `exclude` rejects.
	pub fn accepts(&self, path: &Path) -> bool {
		let path = path.to_string_lossy();

		if let Some(ref include) = self.include {
			return include.iter().any(|m| m.matches(&path));
		}

		if let Some(ref exclude) = self.exclude {
			return !exclude.iter().any(|m| m.matches(&path));
		}

		true
	}
}

/// Selectors exempted from conversion.
#[derive(Debug, Clone, Default)]
pub struct SelectorFilter {
	black_list: Vec<Matcher>,
}

impl SelectorFilter {
	pub fn new(black_list: &[Pattern]) -> Result<Self> {
		Ok(SelectorFilter {
			black_list: compile_all(black_list)?,
		})
	}

	pub fn is_blacklisted(&self, selector: &str) -> bool {
		self.black_list.iter().any(|m| m.matches(selector))
	}
}
