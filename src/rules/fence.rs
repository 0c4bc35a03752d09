use crate::error::Result;
use crate::pipeline::{Fence, FenceState, LineContext, Rule, RuleError, StateSlot};
use crate::rules::code_blocks::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};
use crate::rules::compile_regex;
use regex::Regex;

/// Shields the contents of fenced code blocks from every lower-priority rule.
///
/// Recognises backtick and tilde fences as well as Liquid
/// `{% highlight %}` blocks. Lines inside an open block are claimed
/// unchanged. The `{% endhighlight %}` line is left unclaimed so the
/// code-block rule can turn it into a closing fence.
#[derive(Debug)]
pub struct FenceGuardRule {
	open_re: Regex,
	highlight_re: Regex,
	endhighlight_re: Regex,
}

impl FenceGuardRule {
	pub fn new() -> Result<Self> {
		Ok(FenceGuardRule {
			open_re: compile_regex(r"^ {0,3}(`{3,}|~{3,})")?,
			highlight_re: compile_regex(HIGHLIGHT_OPEN)?,
			endhighlight_re: compile_regex(HIGHLIGHT_CLOSE)?,
		})
	}

	/// The fence a line opens, if any.
	fn opening(&self, line: &str) -> Option<Fence> {
		if let Some(caps) = self.open_re.captures(line) {
			let marker = &caps[1];
			let ch = marker.chars().next()?;
			// Backtick fences cannot have backticks in their info string
			if ch == '`' && line[caps.get(0)?.end()..].contains('`') {
				return None;
			}
			return Some(Fence::Marker {
				ch,
				len: marker.len(),
			});
		}

		self.highlight_re
			.is_match(line)
			.then_some(Fence::Highlight)
	}

	/// Whether `line` closes `fence`.
	fn closes(&self, fence: &Fence, line: &str) -> bool {
		match fence {
			Fence::Marker { ch, len } => {
				let indent = line.len() - line.trim_start_matches(' ').len();
				let rest = line[indent..].trim_end();
				indent <= 3
					&& rest.len() >= *len
					&& rest.chars().all(|c| c == *ch)
			}
			Fence::Highlight => self.endhighlight_re.is_match(line),
		}
	}
}

impl Rule for FenceGuardRule {
	fn name(&self) -> &'static str {
		"code-fence"
	}

	fn evaluate(
		&self,
		line: &str,
		ctx: &LineContext,
	) -> std::result::Result<Option<String>, RuleError> {
		match &ctx.fence {
			FenceState::Open(Fence::Highlight) if self.closes(&Fence::Highlight, line) => Ok(None),
			FenceState::Open(_) => Ok(Some(line.to_string())),
			FenceState::Closed => Ok(None),
		}
	}

	fn state_slot(&self) -> Option<StateSlot> {
		Some(StateSlot::Fence)
	}

	fn advance(&self, line: &str, ctx: &mut LineContext) {
		let next = match &ctx.fence {
			FenceState::Open(fence) if self.closes(fence, line) => Some(FenceState::Closed),
			FenceState::Open(_) => None,
			FenceState::Closed => self.opening(line).map(FenceState::Open),
		};

		if let Some(next) = next {
			ctx.fence = next;
		}
	}
}
