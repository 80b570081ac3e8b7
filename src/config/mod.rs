//! Configuration loading and parsing for px2vw.
//!
//! This module handles:
//! - TOML config file parsing and validation
//! - Config file discovery up the directory tree
//! - The `--init` template

pub mod cascade;
pub mod parser;
pub mod template;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, discover_config, load_config, resolve_config, user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use template::generate_init_template;
pub use types::{
	LoadedConfig, MediaQuery, Options, Pattern, RuleSpec, Transform, TransformFn,
};
