use std::path::PathBuf;

/// Library-level structured errors for px2vw.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum Px2VwError {
	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for option `{option}`: {reason}")]
	InvalidOption { option: String, reason: String },

	#[error("Invalid regex pattern: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to parse stylesheet {path}:{line}:{column}: {message}")]
	StylesheetParse {
		path: String,
		line: u32,
		column: u32,
		message: String,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using Px2VwError.
pub type Result<T> = std::result::Result<T, Px2VwError>;

/// Failure reported by a custom transform.
///
/// Transform failures never abort a file: the declaration is left untouched
/// and the message ends up in the file's [`Report`](crate::convert::Report).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
	pub fn new(message: impl Into<String>) -> Self {
		TransformError(message.into())
	}
}
