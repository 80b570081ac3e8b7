use crate::config::types::Options;
use crate::error::{Px2VwError, Result};
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Options> {
	let content = std::fs::read_to_string(path).map_err(|source| Px2VwError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse options from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Options> {
	let options: Options =
		toml::from_str(content).map_err(|source| Px2VwError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	// Validate the parsed options
	options.validate()?;

	Ok(options)
}
