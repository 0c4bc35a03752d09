//! Jekyll to Pelican rewrite rules for md-migrate.
//!
//! This module handles:
//! - The built-in rules (front matter, code fences, TOC, links)
//! - User-configured sed-like substitutions
//! - The factory that builds a fresh, ordered rule set per file

pub mod code_blocks;
pub mod fence;
pub mod front_matter;
pub mod links;
pub mod substitution;
pub mod toc;

pub use code_blocks::CodeBlockRule;
pub use fence::FenceGuardRule;
pub use front_matter::FrontMatterRule;
pub use links::LinkRule;
pub use substitution::{Substitution, SubstitutionRule};
pub use toc::TocRule;

use crate::config::Settings;
use crate::error::{MigrateError, Result};
use crate::pipeline::{Pipeline, Rule};
use regex::Regex;

/// Compile a regex pattern string.
pub(crate) fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| MigrateError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

/// Build the rule chain for one file, in priority order.
///
/// The order is part of the behaviour: front matter shields metadata, the
/// fence guard shields code, and the content rules only see what is left.
/// Configured substitutions always run last.
pub fn create_rules(settings: &Settings) -> Result<Vec<Box<dyn Rule>>> {
	let mut rules: Vec<Box<dyn Rule>> = vec![
		Box::new(FrontMatterRule::new(
			settings.rename.clone(),
			settings.keep_time,
		)?),
		Box::new(FenceGuardRule::new()?),
		Box::new(CodeBlockRule::new()?),
		Box::new(TocRule::new()?),
		Box::new(LinkRule::new(
			&settings.post_prefix,
			settings.static_paths.clone(),
		)?),
	];

	for substitution in &settings.substitutions {
		rules.push(Box::new(SubstitutionRule::new(
			&substitution.rewrite,
			substitution.name.as_deref(),
		)?));
	}

	Ok(rules)
}

/// Build a ready-to-run pipeline from fresh rules.
pub fn create_pipeline(settings: &Settings) -> Result<Pipeline> {
	Pipeline::new(create_rules(settings)?)
}
