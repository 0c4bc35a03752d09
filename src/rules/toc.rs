use crate::error::Result;
use crate::pipeline::{LineContext, Rule, RuleError};
use crate::rules::compile_regex;
use regex::Regex;

/// Replaces the kramdown table-of-contents idiom with Pelican's `[TOC]`.
///
/// kramdown writes the TOC as a one-item list followed by `{:toc}`:
///
/// ```text
/// * Table of Contents
/// {:toc}
/// ```
///
/// The placeholder item becomes an empty line (line count never changes)
/// and the `{:toc}` line becomes `[TOC]`.
#[derive(Debug)]
pub struct TocRule {
	placeholder_re: Regex,
}

impl TocRule {
	pub fn new() -> Result<Self> {
		Ok(TocRule {
			placeholder_re: compile_regex(r"^\s*(?:[*+-]|\d+\.)\s+Table of Contents\s*$")?,
		})
	}
}

impl Rule for TocRule {
	fn name(&self) -> &'static str {
		"table-of-contents"
	}

	fn evaluate(
		&self,
		line: &str,
		_ctx: &LineContext,
	) -> std::result::Result<Option<String>, RuleError> {
		if self.placeholder_re.is_match(line) {
			return Ok(Some(String::new()));
		}
		if line.contains("{:toc}") {
			return Ok(Some("[TOC]".to_string()));
		}
		Ok(None)
	}
}
