use super::runner::RuleError;

/// Identifies a piece of cross-line state owned by exactly one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSlot {
	FrontMatter,
	Fence,
}

/// The front-matter header as rewritten before the pass starts.
///
/// Block lists are folded into their key line, so the rewritten header can
/// be shorter than the original. The closing `---` then moves up and the
/// freed lines after it are left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatterState {
	/// Output for lines `0..planned.len()`. Empty when the file has no header.
	pub planned: Vec<String>,

	/// The first malformed header line, reported when the pass reaches it.
	pub error: Option<(usize, RuleError)>,
}

impl FrontMatterState {
	pub fn is_inside(&self, line_number: usize) -> bool {
		line_number < self.planned.len()
	}
}

/// The delimiter that opened the current fenced block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fence {
	/// A run of backticks or tildes.
	Marker { ch: char, len: usize },

	/// A Liquid `{% highlight %}` tag.
	Highlight,
}

/// Whether the pass is inside a fenced code block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FenceState {
	#[default]
	Closed,
	Open(Fence),
}

impl FenceState {
	pub fn is_open(&self) -> bool {
		matches!(self, FenceState::Open(_))
	}
}

/// Mutable state threaded through one file's pass.
///
/// Each stateful rule owns one field and declares it through
/// [`Rule::state_slot`](super::Rule::state_slot); rules only read the
/// context while evaluating and write their own slot in `prepare` and
/// `advance`.
#[derive(Debug, Clone, Default)]
pub struct LineContext {
	/// 0-based index of the line being processed.
	pub line_number: usize,

	/// Owned by the front-matter rule.
	pub front_matter: FrontMatterState,

	/// Owned by the code-fence guard.
	pub fence: FenceState,
}

impl LineContext {
	pub fn new() -> Self {
		Self::default()
	}
}
