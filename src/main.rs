use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use md_migrate::config::{
	CONFIG_FILE_NAME, LoadedConfig, discover_configs, generate_init_template, load_single_config,
	merge_configs, user_config_path,
};
use md_migrate::migrate::{MigrateOptions, Migrator, expand_patterns};
use md_migrate::pipeline::Rule;
use md_migrate::rules::create_pipeline;

#[derive(Parser)]
#[command(name = "md-migrate")]
#[command(
	author,
	version,
	about = "CLI tool for migrating Jekyll Markdown posts to Pelican"
)]
#[command(arg_required_else_help = true, args_conflicts_with_subcommands = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template .md-migrate.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .md-migrate.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Report what would change without writing anything
	#[arg(long)]
	dry_run: bool,

	/// Use this config file instead of discovering .md-migrate.toml files
	#[arg(long, value_name = "FILE", global = true)]
	config: Option<PathBuf>,

	/// Log rule activity
	#[arg(short, long, global = true, conflicts_with = "quiet")]
	verbose: bool,

	/// Only log warnings and errors
	#[arg(short, long, global = true)]
	quiet: bool,

	/// Markdown files or glob patterns ending with .md (e.g. "_posts/*.md")
	#[arg(value_name = "PATTERN")]
	patterns: Vec<String>,
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
	/// Display config files and the effective rule chain
	Show,
	/// Check all config files for errors without migrating anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(cli.config.as_deref()),
				ConfigAction::Validate => handle_config_validate(cli.config.as_deref()),
			},
		};
	}

	if !cli.patterns.is_empty() {
		let options = MigrateOptions {
			dry_run: cli.dry_run,
		};
		return handle_migrate(&cli.patterns, cli.config.as_deref(), options);
	}

	// No patterns specified - this shouldn't happen due to arg_required_else_help
	Ok(ExitCode::SUCCESS)
}

/// Initialise tracing-based logging.
///
/// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
	let filter = if std::env::var("RUST_LOG").is_ok() {
		EnvFilter::from_default_env()
	} else if quiet {
		EnvFilter::new("warn")
	} else if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::new("info")
	};

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init();
}

fn load_configs(config: Option<&Path>) -> Result<Vec<LoadedConfig>> {
	match config {
		Some(path) => load_single_config(path)
			.with_context(|| format!("Failed to load config {}", path.display())),
		None => {
			let cwd = std::env::current_dir().context("Failed to get current directory")?;
			discover_configs(&cwd).context("Failed to discover config files")
		}
	}
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

fn handle_config_show(config: Option<&Path>) -> Result<ExitCode> {
	let configs = load_configs(config)?;

	if configs.is_empty() {
		println!("No configuration files found, using defaults.\n");
	} else {
		println!("Configuration files (in cascade order):\n");
		for loaded in &configs {
			println!("# Source: {}", loaded.path.display());
			println!("# root: {}", loaded.config.root);
			println!("# substitutions: {}", loaded.config.substitutions.len());
			println!();
		}
	}

	let merged = merge_configs(&configs);
	let settings = merged.settings();

	println!("Effective settings:");
	println!("  keep-time: {}", settings.keep_time);
	println!("  post-prefix: {:?}", settings.post_prefix);
	for (from, to) in &settings.rename {
		println!("  rename: {from} -> {to}");
	}
	for remap in &settings.static_paths {
		println!("  static-path: {} -> {}", remap.from, remap.to);
	}
	println!();

	let pipeline = create_pipeline(&settings).context("Failed to build rules")?;
	println!("Rule chain (first match wins):");
	let mut sources = merged.substitutions.iter().map(|sub| &sub.source);
	for (i, rule) in pipeline.rules().iter().enumerate() {
		match rule.label() {
			Some(label) => {
				let source = sources
					.next()
					.map_or_else(String::new, |path| format!(" ({})", path.display()));
				println!("  {}. {} {}{}", i + 1, rule.name(), label, source);
			}
			None => println!("  {}. {}", i + 1, rule.name()),
		}
	}

	// Show user config path
	if let Ok(user_path) = user_config_path() {
		println!();
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(config: Option<&Path>) -> Result<ExitCode> {
	let configs = match load_configs(config) {
		Ok(configs) => configs,
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			return Ok(ExitCode::FAILURE);
		}
	};

	if let Err(e) = create_pipeline(&merge_configs(&configs).settings()) {
		eprintln!("Configuration error: {e}");
		return Ok(ExitCode::FAILURE);
	}

	if configs.is_empty() {
		println!("No configuration files found.");
	} else {
		println!("All configuration files are valid:");
		for loaded in &configs {
			println!(
				"  {} ({} substitutions)",
				loaded.path.display(),
				loaded.config.substitutions.len()
			);
		}
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_migrate(
	patterns: &[String],
	config: Option<&Path>,
	options: MigrateOptions,
) -> Result<ExitCode> {
	let configs = load_configs(config)?;
	let migrator = Migrator::new(merge_configs(&configs).settings());

	let paths = expand_patterns(patterns).context("Invalid file pattern")?;
	if paths.is_empty() {
		anyhow::bail!("No files matched {}", patterns.join(" "));
	}

	let mut failures = 0;
	for (path, result) in migrator.migrate_all(&paths, options) {
		match result {
			Ok(report) if options.dry_run => println!(
				"Would migrate {} ({} of {} lines changed)",
				path.display(),
				report.changed_lines,
				report.lines
			),
			Ok(report) => println!(
				"Migrated {} ({} lines changed)",
				path.display(),
				report.changed_lines
			),
			Err(e) => {
				failures += 1;
				let error = anyhow::Error::new(e);
				eprintln!("Failed to migrate {}: {error:#}", path.display());
			}
		}
	}

	if failures > 0 {
		eprintln!("{failures} of {} files failed", paths.len());
		return Ok(ExitCode::FAILURE);
	}
	Ok(ExitCode::SUCCESS)
}
