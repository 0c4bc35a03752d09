use std::path::PathBuf;

/// Library-level structured errors for md-migrate.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
	#[error("Cannot read input file: {path}")]
	Input {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Input is not a regular file: {path}")]
	NotAFile { path: PathBuf },

	#[error("Input is not valid UTF-8: {path}")]
	NotUtf8 { path: PathBuf },

	#[error("Failed to write backup file: {path}")]
	Backup {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Rule '{rule}' failed on line {line}: {message}")]
	Rule {
		rule: &'static str,
		line: usize,
		message: String,
	},

	#[error("Failed to write migrated file: {path}")]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to read config file: {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid setting in {path}: {message}")]
	InvalidSetting { path: PathBuf, message: String },

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid pattern: {pattern} ({reason})")]
	InvalidPattern { pattern: String, reason: String },

	#[error("Rules '{first}' and '{second}' both claim the {slot:?} state slot")]
	DuplicateStateSlot {
		slot: crate::pipeline::StateSlot,
		first: &'static str,
		second: &'static str,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using MigrateError.
pub type Result<T> = std::result::Result<T, MigrateError>;
