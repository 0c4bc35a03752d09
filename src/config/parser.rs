use crate::config::types::Config;
use crate::error::{MigrateError, Result};
use crate::rules::Substitution;
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| MigrateError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let config: Config =
		toml::from_str(content).map_err(|source| MigrateError::ConfigParse {
			path: path.to_path_buf(),
			source,
		})?;

	// Validate the parsed config
	validate(&config, path)?;

	Ok(config)
}

/// Check that every substitution compiles, every rename names a key and
/// every remap has a prefix.
fn validate(config: &Config, path: &Path) -> Result<()> {
	let invalid = |message: String| MigrateError::InvalidSetting {
		path: path.to_path_buf(),
		message,
	};

	for substitution in &config.substitutions {
		Substitution::parse(&substitution.rewrite)?;
	}

	for (from, to) in &config.front_matter.rename {
		if !is_metadata_key(from) || !is_metadata_key(to) {
			return Err(invalid(format!(
				"rename '{from}' -> '{to}' must map one metadata key to another"
			)));
		}
	}

	for remap in &config.links.static_paths {
		if remap.from.is_empty() {
			return Err(invalid(format!(
				"static path remap to '{}' needs a non-empty 'from' prefix",
				remap.to
			)));
		}
	}

	Ok(())
}

/// Keys Python-Markdown accepts in a metadata header.
fn is_metadata_key(key: &str) -> bool {
	!key.is_empty()
		&& key
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
