use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig, SubstitutionWithSource};
use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};

/// File name looked up in each directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".md-migrate.toml";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.md-migrate.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.md-migrate.toml
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = discover_project_configs(start_dir)?;

	if let Some(user_config) = load_user_config(&configs)? {
		configs.push(user_config);
	}

	Ok(configs)
}

/// Walk up from `start_dir` collecting config files, stopping after a root config.
pub fn discover_project_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = start_dir.to_path_buf();

	loop {
		let config_path = current_dir.join(CONFIG_FILE_NAME);

		if config_path.is_file() {
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		// Move to parent directory
		if let Some(parent) = current_dir.parent() {
			current_dir = parent.to_path_buf();
		} else {
			break;
		}
	}

	Ok(configs)
}

/// Load the user's ~/.md-migrate.toml if it exists and wasn't already visited.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	let user_config_path = user_config_path()?;

	// The walk may already have passed through the home directory.
	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.is_file() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Load exactly one config file, bypassing discovery.
pub fn load_single_config(path: &Path) -> Result<Vec<LoadedConfig>> {
	let config = parse_config_file(path)?;
	Ok(vec![LoadedConfig {
		config,
		path: path.to_path_buf(),
	}])
}

/// Merge multiple configs into a single effective config.
///
/// Scalars take the value from the most specific file that sets them.
/// Rename entries from more specific files override less specific ones.
/// Static path remaps and substitutions are collected in cascade order.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		let config = &loaded.config;

		if merged.keep_time.is_none() {
			merged.keep_time = config.front_matter.keep_time;
		}
		if merged.post_prefix.is_none() {
			merged.post_prefix = config.links.post_prefix.clone();
		}

		for (from, to) in &config.front_matter.rename {
			merged
				.rename
				.entry(from.clone())
				.or_insert_with(|| to.clone());
		}

		merged
			.static_paths
			.extend(config.links.static_paths.iter().cloned());

		for substitution in &config.substitutions {
			merged.substitutions.push(SubstitutionWithSource {
				substitution: substitution.clone(),
				source: loaded.path.clone(),
			});
		}
	}

	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(MigrateError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::parse_config_str;
	use crate::config::types::PathRemap;
	use std::fs;

	fn loaded(content: &str, path: &str) -> LoadedConfig {
		let path = PathBuf::from(path);
		LoadedConfig {
			config: parse_config_str(content, &path).unwrap(),
			path,
		}
	}

	#[test]
	fn test_user_config_path() {
		let path = user_config_path();
		assert!(path.is_ok());
		let path = path.unwrap();
		assert!(path.ends_with(".md-migrate.toml"));
	}

	#[test]
	fn test_merge_most_specific_scalar_wins() {
		let configs = vec![
			loaded("[front-matter]\nkeep-time = true", "inner.toml"),
			loaded(
				"[front-matter]\nkeep-time = false\n[links]\npost-prefix = \"tips/\"",
				"outer.toml",
			),
		];

		let merged = merge_configs(&configs);
		assert_eq!(merged.keep_time, Some(true));
		assert_eq!(merged.post_prefix, Some("tips/".to_string()));
	}

	#[test]
	fn test_merge_rename_specific_overrides() {
		let configs = vec![
			loaded("[front-matter.rename]\nexcerpt = \"excerpt\"", "inner.toml"),
			loaded(
				"[front-matter.rename]\nexcerpt = \"summary\"\npermalink = \"slug\"",
				"outer.toml",
			),
		];

		let settings = merge_configs(&configs).settings();
		assert_eq!(settings.rename.get("excerpt"), Some(&"excerpt".to_string()));
		assert_eq!(settings.rename.get("permalink"), Some(&"slug".to_string()));
		// Defaults survive when nobody overrides them
		assert_eq!(
			settings.rename.get("description"),
			Some(&"summary".to_string())
		);
	}

	#[test]
	fn test_merge_lists_in_cascade_order() {
		let configs = vec![
			loaded(
				"[links]\nstatic-paths = [{ from = \"/a/\", to = \"/x/\" }]\n[[substitutions]]\nrewrite = \"s/1/2/\"",
				"inner.toml",
			),
			loaded(
				"[links]\nstatic-paths = [{ from = \"/b/\", to = \"/y/\" }]\n[[substitutions]]\nrewrite = \"s/3/4/\"",
				"outer.toml",
			),
		];

		let merged = merge_configs(&configs);
		assert_eq!(
			merged.static_paths,
			vec![
				PathRemap {
					from: "/a/".to_string(),
					to: "/x/".to_string()
				},
				PathRemap {
					from: "/b/".to_string(),
					to: "/y/".to_string()
				},
			]
		);
		assert_eq!(merged.substitutions[0].substitution.rewrite, "s/1/2/");
		assert_eq!(merged.substitutions[0].source, PathBuf::from("inner.toml"));
		assert_eq!(merged.substitutions[1].substitution.rewrite, "s/3/4/");
	}

	#[test]
	fn test_empty_merge_uses_defaults() {
		let settings = merge_configs(&[]).settings();
		assert!(!settings.keep_time);
		assert_eq!(settings.post_prefix, "");
		assert_eq!(settings.rename.len(), 3);
	}

	#[test]
	fn test_discover_stops_at_root() {
		let temp_dir = tempfile::tempdir().unwrap();
		let outer = temp_dir.path();
		let inner = outer.join("blog");
		fs::create_dir(&inner).unwrap();

		fs::write(outer.join(CONFIG_FILE_NAME), "root = true\n").unwrap();
		fs::write(
			inner.join(CONFIG_FILE_NAME),
			"[links]\npost-prefix = \"articles/\"\n",
		)
		.unwrap();

		let configs = discover_project_configs(&inner).unwrap();
		assert_eq!(configs.len(), 2);
		assert_eq!(configs[0].path, inner.join(CONFIG_FILE_NAME));
		assert_eq!(configs[1].path, outer.join(CONFIG_FILE_NAME));
	}

	#[test]
	fn test_discover_root_in_start_dir_skips_parents() {
		let temp_dir = tempfile::tempdir().unwrap();
		let outer = temp_dir.path();
		let inner = outer.join("blog");
		fs::create_dir(&inner).unwrap();

		fs::write(outer.join(CONFIG_FILE_NAME), "root = true\n").unwrap();
		fs::write(inner.join(CONFIG_FILE_NAME), "root = true\n").unwrap();

		let configs = discover_project_configs(&inner).unwrap();
		assert_eq!(configs.len(), 1);
	}

	#[test]
	fn test_load_single_config() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("custom.toml");
		fs::write(&path, "[front-matter]\nkeep-time = true\n").unwrap();

		let configs = load_single_config(&path).unwrap();
		assert_eq!(configs.len(), 1);
		assert!(merge_configs(&configs).settings().keep_time);
	}
}
