use crate::config::parser::parse_config_file;
use crate::config::types::LoadedConfig;
use crate::error::{Px2VwError, Result};
use std::path::{Path, PathBuf};

/// Name of the per-project config file.
pub const CONFIG_FILE_NAME: &str = ".px2vw.toml";

/// Find the config file that applies to `start_dir`.
///
/// The lookup order is:
/// 1. Start from `start_dir` and look for `.px2vw.toml`
/// 2. Continue up the directory tree, nearest file wins
/// 3. Finally, check ~/.px2vw.toml
pub fn discover_config(start_dir: &Path) -> Result<Option<LoadedConfig>> {
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let config_path = dir.join(CONFIG_FILE_NAME);
		if config_path.is_file() {
			return load_config(&config_path).map(Some);
		}
		current_dir = dir.parent();
	}

	load_user_config()
}

/// Load the user's ~/.px2vw.toml if it exists.
fn load_user_config() -> Result<Option<LoadedConfig>> {
	let user_config_path = user_config_path()?;

	if user_config_path.is_file() {
		load_config(&user_config_path).map(Some)
	} else {
		Ok(None)
	}
}

/// Load a specific config file, failing if it does not exist.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
	if !path.exists() {
		return Err(Px2VwError::ConfigNotFound {
			path: path.to_path_buf(),
		});
	}

	let options = parse_config_file(path)?;
	tracing::debug!(path = %path.display(), "loaded config");

	Ok(LoadedConfig {
		options,
		path: path.to_path_buf(),
	})
}

/// The config in effect: an explicit file if given, otherwise a discovered one.
///
/// `None` means no file applies and the defaults are used.
pub fn resolve_config(explicit: Option<&Path>, start_dir: &Path) -> Result<Option<LoadedConfig>> {
	match explicit {
		Some(path) => load_config(path).map(Some),
		None => discover_config(start_dir),
	}
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(Px2VwError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
