use crate::error::Result;
use crate::pipeline::{LineContext, Rule, RuleError};
use crate::rules::compile_regex;
use regex::Regex;

/// A `{% highlight LANG opts %}` tag at the start of a line.
pub(crate) const HIGHLIGHT_OPEN: &str = r"^(\s*)\{%-?\s*highlight\b(?:\s+([^\s%]+))?[^%]*-?%\}";

/// A `{% endhighlight %}` tag at the start of a line.
pub(crate) const HIGHLIGHT_CLOSE: &str = r"^(\s*)\{%-?\s*endhighlight\s*-?%\}";

/// Turns Liquid `{% highlight %}` blocks into Markdown fences.
///
/// `{% highlight ruby linenos %}` becomes ```` ```ruby ````; options after
/// the language are dropped. Leading indentation is kept so blocks nested
/// in list items stay nested.
#[derive(Debug)]
pub struct CodeBlockRule {
	open_re: Regex,
	close_re: Regex,
}

impl CodeBlockRule {
	pub fn new() -> Result<Self> {
		Ok(CodeBlockRule {
			open_re: compile_regex(HIGHLIGHT_OPEN)?,
			close_re: compile_regex(HIGHLIGHT_CLOSE)?,
		})
	}
}

impl Rule for CodeBlockRule {
	fn name(&self) -> &'static str {
		"code-blocks"
	}

	fn evaluate(
		&self,
		line: &str,
		_ctx: &LineContext,
	) -> std::result::Result<Option<String>, RuleError> {
		if let Some(caps) = self.open_re.captures(line) {
			let indent = &caps[1];
			let language = caps.get(2).map_or("", |m| m.as_str());
			return Ok(Some(format!("{indent}```{language}")));
		}

		if let Some(caps) = self.close_re.captures(line) {
			return Ok(Some(format!("{}```", &caps[1])));
		}

		Ok(None)
	}
}
