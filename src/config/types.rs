use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration from a `.md-migrate.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop directory cascade and jump directly to ~/.md-migrate.toml.
	#[serde(default)]
	pub root: bool,

	/// Front-matter translation settings.
	#[serde(default)]
	pub front_matter: FrontMatterConfig,

	/// Liquid link rewriting settings.
	#[serde(default)]
	pub links: LinksConfig,

	/// Extra sed-style rewrites, applied after the built-in rules.
	#[serde(default)]
	pub substitutions: Vec<SubstitutionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FrontMatterConfig {
	/// Keep the time of day in date fields (the zone is always dropped).
	pub keep_time: Option<bool>,

	/// Source key -> target key renames, layered over the defaults.
	#[serde(default)]
	pub rename: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LinksConfig {
	/// Directory prepended to `post_url` targets, relative to the content root.
	pub post_prefix: Option<String>,

	/// Prefix remaps applied to `{{ site.url }}` paths. First match wins.
	#[serde(default)]
	pub static_paths: Vec<PathRemap>,
}

/// Replace a leading `from` with `to`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathRemap {
	pub from: String,
	pub to: String,
}

/// A user-supplied sed-style rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubstitutionConfig {
	/// Label shown in logs and `config show`.
	pub name: Option<String>,

	/// Format: "s/pattern/replacement/" or "s/pattern/replacement/g" for global.
	pub rewrite: String,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

/// Merged configuration from multiple config files in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	pub keep_time: Option<bool>,
	pub rename: BTreeMap<String, String>,
	pub post_prefix: Option<String>,
	pub static_paths: Vec<PathRemap>,
	pub substitutions: Vec<SubstitutionWithSource>,
}

/// A substitution with its source config path for debugging/display.
#[derive(Debug, Clone)]
pub struct SubstitutionWithSource {
	pub substitution: SubstitutionConfig,
	pub source: PathBuf,
}

/// Effective settings handed to the rule factory.
#[derive(Debug, Clone)]
pub struct Settings {
	pub keep_time: bool,
	pub rename: BTreeMap<String, String>,
	pub post_prefix: String,
	pub static_paths: Vec<PathRemap>,
	pub substitutions: Vec<SubstitutionConfig>,
}

/// Front-matter key renames applied when no config overrides them.
pub const DEFAULT_RENAMES: &[(&str, &str)] = &[
	("description", "summary"),
	("excerpt", "summary"),
	("last_modified_at", "modified"),
];

impl Default for Settings {
	fn default() -> Self {
		Settings {
			keep_time: false,
			rename: DEFAULT_RENAMES
				.iter()
				.map(|(from, to)| (from.to_string(), to.to_string()))
				.collect(),
			post_prefix: String::new(),
			static_paths: Vec::new(),
			substitutions: Vec::new(),
		}
	}
}

impl MergedConfig {
	/// Resolve defaults into the settings the rules consume.
	pub fn settings(&self) -> Settings {
		let mut settings = Settings::default();
		if let Some(keep_time) = self.keep_time {
			settings.keep_time = keep_time;
		}
		settings
			.rename
			.extend(self.rename.iter().map(|(k, v)| (k.clone(), v.clone())));
		if let Some(ref prefix) = self.post_prefix {
			settings.post_prefix = prefix.clone();
		}
		settings.static_paths = self.static_paths.clone();
		settings.substitutions = self
			.substitutions
			.iter()
			.map(|s| s.substitution.clone())
			.collect();
		settings
	}
}
