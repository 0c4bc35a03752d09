use crate::error::{MigrateError, Result};
use crate::pipeline::{LineContext, Rule, RuleError};
use regex::Regex;
use std::borrow::Cow;

/// Parsed substitution command (sed-like syntax).
#[derive(Debug)]
pub struct Substitution {
	/// The pattern to match.
	pub pattern: Regex,

	/// The replacement string, with `$1`-style capture references.
	pub replacement: String,

	/// Whether to replace all occurrences (global flag).
	pub global: bool,
}

impl Substitution {
	/// Parse a substitution string in sed-like format: "s/pattern/replacement/" or "s/pattern/replacement/g"
	pub fn parse(input: &str) -> Result<Self> {
		let malformed = |reason: &str| MigrateError::InvalidPattern {
			pattern: input.to_string(),
			reason: reason.to_string(),
		};

		let mut chars = input.chars();
		if chars.next() != Some('s') {
			return Err(malformed("substitution must start with 's'"));
		}
		let delimiter = chars
			.next()
			.ok_or_else(|| malformed("substitution too short"))?;
		if delimiter.is_alphanumeric() || delimiter == '\\' {
			return Err(malformed("delimiter must be a punctuation character"));
		}

		let parts = split_by_delimiter(chars.as_str(), delimiter);
		let [pattern_str, replacement, rest @ ..] = parts.as_slice() else {
			return Err(malformed("substitution must have pattern and replacement"));
		};

		let flags = rest.first().map(String::as_str).unwrap_or("");
		if rest.len() > 1 || flags.chars().any(|c| c != 'g') {
			return Err(malformed("only the 'g' flag is supported"));
		}

		let pattern = Regex::new(pattern_str).map_err(|source| MigrateError::InvalidRegex {
			pattern: pattern_str.to_string(),
			source,
		})?;

		Ok(Substitution {
			pattern,
			replacement: replacement.clone(),
			global: flags.contains('g'),
		})
	}

	/// Apply this substitution to a string.
	pub fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
		if self.global {
			self.pattern.replace_all(input, self.replacement.as_str())
		} else {
			self.pattern.replace(input, self.replacement.as_str())
		}
	}
}

/// Split a string by a delimiter, respecting backslash escapes.
fn split_by_delimiter(input: &str, delimiter: char) -> Vec<String> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\\' && chars.peek() == Some(&delimiter) {
			// An escaped delimiter is literal
			current.push(delimiter);
			chars.next();
		} else if c == delimiter {
			parts.push(std::mem::take(&mut current));
		} else {
			current.push(c);
		}
	}

	// A trailing delimiter leaves an empty flags part, which is fine
	parts.push(current);

	parts
}

/// A configured sed-style rewrite, claiming only lines it actually changes.
#[derive(Debug)]
pub struct SubstitutionRule {
	substitution: Substitution,
	label: String,
}

impl SubstitutionRule {
	pub fn new(rewrite: &str, label: Option<&str>) -> Result<Self> {
		Ok(SubstitutionRule {
			substitution: Substitution::parse(rewrite)?,
			label: label.unwrap_or(rewrite).to_string(),
		})
	}
}

impl Rule for SubstitutionRule {
	fn name(&self) -> &'static str {
		"substitution"
	}

	fn label(&self) -> Option<&str> {
		Some(&self.label)
	}

	fn evaluate(
		&self,
		line: &str,
		_ctx: &LineContext,
	) -> std::result::Result<Option<String>, RuleError> {
		match self.substitution.apply(line) {
			Cow::Owned(rewritten) if rewritten != line => Ok(Some(rewritten)),
			_ => Ok(None),
		}
	}
}
