use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use px2vw::config::{
	CONFIG_FILE_NAME, Options, generate_init_template, resolve_config, user_config_path,
};
use px2vw::convert::{Converter, Report};

#[derive(Parser)]
#[command(name = "px2vw")]
#[command(
	author,
	version,
	about = "Convert pixel lengths in stylesheets into viewport units"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template .px2vw.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .px2vw.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Use this config file instead of searching for .px2vw.toml
	#[arg(short, long, value_name = "PATH", global = true)]
	config: Option<PathBuf>,

	/// Rewrite input files in place
	#[arg(short, long, conflicts_with = "out_dir")]
	write: bool,

	/// Write converted files into this directory
	#[arg(short, long, value_name = "DIR")]
	out_dir: Option<PathBuf>,

	/// Design width in pixels
	#[arg(long, value_name = "PX")]
	viewport_width: Option<f64>,

	/// Unit written for converted lengths
	#[arg(long, value_name = "UNIT")]
	viewport_unit: Option<String>,

	/// Decimal places kept in converted numbers
	#[arg(long, value_name = "DIGITS")]
	unit_precision: Option<i32>,

	/// Emit an @media (orientation: landscape) block
	#[arg(long)]
	landscape: bool,

	/// Keep original declarations and append converted copies
	#[arg(long)]
	no_replace: bool,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	/// Only log errors
	#[arg(short, long, conflicts_with = "verbose", global = true)]
	quiet: bool,

	/// Stylesheets to convert, `-` reads stdin
	files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective options and where they came from
	Show,
	/// Load and compile the configuration without converting anything
	Validate,
}

/// A converted input waiting to be written out.
struct Converted {
	input: PathBuf,
	css: String,
	report: Report,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: u8, quiet: bool) {
	let level = if quiet {
		Level::ERROR
	} else {
		match verbose {
			0 => Level::WARN,
			1 => Level::INFO,
			2 => Level::DEBUG,
			_ => Level::TRACE,
		}
	};

	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = &cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(&cli),
				ConfigAction::Validate => handle_config_validate(&cli),
			},
		};
	}

	if !cli.files.is_empty() {
		return handle_convert(&cli);
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn effective_options(cli: &Cli) -> Result<(Options, Option<PathBuf>)> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let loaded =
		resolve_config(cli.config.as_deref(), &cwd).context("Failed to load configuration")?;
	let (mut options, source) = match loaded {
		Some(loaded) => (loaded.options, Some(loaded.path)),
		None => (Options::default(), None),
	};

	if let Some(width) = cli.viewport_width {
		options.viewport_width = width;
	}
	if let Some(unit) = &cli.viewport_unit {
		options.viewport_unit = unit.clone();
	}
	if let Some(precision) = cli.unit_precision {
		options.unit_precision = precision;
	}
	if cli.landscape {
		options.landscape = true;
	}
	if cli.no_replace {
		options.replace = false;
	}

	Ok((options, source))
}

fn handle_config_show(cli: &Cli) -> Result<ExitCode> {
	let (options, source) = effective_options(cli)?;

	match source {
		Some(path) => println!("# Source: {}", path.display()),
		None => println!("# Source: built-in defaults"),
	}
	if let Ok(user_path) = user_config_path() {
		let state = if user_path.exists() { "exists" } else { "not found" };
		println!("# User config path: {} ({state})", user_path.display());
	}
	println!();

	let rendered = toml::to_string_pretty(&options).context("Failed to render options")?;
	print!("{rendered}");

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(cli: &Cli) -> Result<ExitCode> {
	let checked = effective_options(cli).and_then(|(options, source)| {
		Converter::new(&options)?;
		Ok((options, source))
	});

	match checked {
		Ok((options, Some(path))) => {
			println!(
				"Configuration is valid: {} ({} rules)",
				path.display(),
				options.rules.len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Ok((_, None)) => {
			println!("No configuration files found. Defaults are valid.");
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_convert(cli: &Cli) -> Result<ExitCode> {
	let (options, _) = effective_options(cli)?;
	let converter = Converter::new(&options).context("Invalid configuration")?;

	let reads_stdin = cli.files.iter().any(|file| is_stdin(file));
	if reads_stdin && (cli.write || cli.out_dir.is_some()) {
		anyhow::bail!("`-` cannot be combined with --write or --out-dir");
	}

	let targets = match &cli.out_dir {
		Some(dir) => Some(out_dir_targets(dir, &cli.files)?),
		None => None,
	};

	let results: Vec<Result<Converted>> = cli
		.files
		.par_iter()
		.map(|file| convert_file(&converter, file))
		.collect();

	let mut failed = false;
	for (index, result) in results.into_iter().enumerate() {
		let target = targets.as_ref().map(|targets| targets[index].as_path());
		if let Err(e) = result.and_then(|converted| emit(cli, &converted, target)) {
			eprintln!("error: {e:?}");
			failed = true;
		}
	}

	Ok(if failed {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	})
}

/// Output paths under `dir`, one per input, keyed by file name.
///
/// Two inputs with the same file name would overwrite each other, so that is an error.
fn out_dir_targets(dir: &Path, files: &[PathBuf]) -> Result<Vec<PathBuf>> {
	let mut seen: HashMap<&OsStr, &Path> = HashMap::new();
	let mut targets = Vec::with_capacity(files.len());

	for file in files {
		let name = file
			.file_name()
			.with_context(|| format!("No file name in {}", file.display()))?;
		if let Some(previous) = seen.insert(name, file.as_path()) {
			anyhow::bail!(
				"{} and {} would both be written to {}",
				previous.display(),
				file.display(),
				dir.join(name).display()
			);
		}
		targets.push(dir.join(name));
	}

	Ok(targets)
}

/// Write one converted input to its destination.
fn emit(cli: &Cli, converted: &Converted, target: Option<&Path>) -> Result<()> {
	tracing::info!(
		file = %converted.input.display(),
		converted = converted.report.converted,
		landscape = converted.report.landscape_rules,
		skipped = converted.report.skipped,
		"processed"
	);

	if cli.write {
		if !converted.report.skipped {
			write_output(&converted.input, &converted.css)?;
		}
	} else if let Some(target) = target {
		if let Some(dir) = target.parent() {
			std::fs::create_dir_all(dir)
				.with_context(|| format!("Failed to create {}", dir.display()))?;
		}
		write_output(target, &converted.css)?;
	} else {
		std::io::stdout()
			.lock()
			.write_all(converted.css.as_bytes())
			.context("Failed to write to stdout")?;
	}

	Ok(())
}

fn is_stdin(path: &Path) -> bool {
	path.as_os_str() == "-"
}

fn convert_file(converter: &Converter, file: &Path) -> Result<Converted> {
	let (source, path) = if is_stdin(file) {
		let mut source = String::new();
		std::io::stdin()
			.read_to_string(&mut source)
			.context("Failed to read stdin")?;
		(source, None)
	} else {
		let source = std::fs::read_to_string(file)
			.with_context(|| format!("Failed to read {}", file.display()))?;
		(source, Some(file))
	};

	let (css, report) = converter
		.process_source(&source, path)
		.with_context(|| format!("Failed to convert {}", file.display()))?;

	Ok(Converted {
		input: file.to_path_buf(),
		css,
		report,
	})
}

fn write_output(path: &Path, css: &str) -> Result<()> {
	std::fs::write(path, css).with_context(|| format!("Failed to write {}", path.display()))
}
