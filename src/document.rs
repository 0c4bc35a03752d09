//! Splitting file content into lines and putting it back together.

/// Line terminator observed in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
	#[default]
	Lf,
	CrLf,
}

impl LineEnding {
	pub fn as_str(&self) -> &'static str {
		match self {
			LineEnding::Lf => "\n",
			LineEnding::CrLf => "\r\n",
		}
	}
}

/// A text file as a sequence of lines without terminators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
	pub lines: Vec<String>,
	pub line_ending: LineEnding,
	pub trailing_newline: bool,
}

impl Document {
	/// Split `text` into lines, remembering its line ending convention.
	///
	/// The convention is taken from the first line break. Lone `\r`
	/// characters inside a CRLF file stay part of the line.
	pub fn parse(text: &str) -> Self {
		let line_ending = match text.find('\n') {
			Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => LineEnding::CrLf,
			_ => LineEnding::Lf,
		};
		let trailing_newline = text.ends_with('\n');

		let body = text.strip_suffix('\n').unwrap_or(text);
		let lines = if text.is_empty() {
			Vec::new()
		} else {
			body.split('\n')
				.map(|line| match line_ending {
					LineEnding::CrLf => line.strip_suffix('\r').unwrap_or(line).to_string(),
					LineEnding::Lf => line.to_string(),
				})
				.collect()
		};

		Document {
			lines,
			line_ending,
			trailing_newline,
		}
	}

	/// Same layout, different content.
	pub fn with_lines(&self, lines: Vec<String>) -> Self {
		Document {
			lines,
			line_ending: self.line_ending,
			trailing_newline: self.trailing_newline,
		}
	}

	/// Join the lines back with the original ending and final newline.
	pub fn render(&self) -> String {
		let eol = self.line_ending.as_str();
		let mut out = self.lines.join(eol);
		if self.trailing_newline {
			out.push_str(eol);
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_lf_with_trailing_newline() {
		let doc = Document::parse("a\nb\n");
		assert_eq!(doc.lines, vec!["a", "b"]);
		assert_eq!(doc.line_ending, LineEnding::Lf);
		assert!(doc.trailing_newline);
		assert_eq!(doc.render(), "a\nb\n");
	}

	#[test]
	fn test_no_trailing_newline() {
		let doc = Document::parse("a\nb");
		assert!(!doc.trailing_newline);
		assert_eq!(doc.render(), "a\nb");
	}

	#[test]
	fn test_crlf_preserved() {
		let doc = Document::parse("---\r\ntitle: x\r\n---\r\n");
		assert_eq!(doc.line_ending, LineEnding::CrLf);
		assert_eq!(doc.lines, vec!["---", "title: x", "---"]);
		assert_eq!(doc.render(), "---\r\ntitle: x\r\n---\r\n");
	}

	#[test]
	fn test_blank_lines_kept() {
		let doc = Document::parse("a\n\n\nb\n\n");
		assert_eq!(doc.lines, vec!["a", "", "", "b", ""]);
		assert_eq!(doc.render(), "a\n\n\nb\n\n");
	}

	#[test]
	fn test_empty_document() {
		let doc = Document::parse("");
		assert!(doc.lines.is_empty());
		assert_eq!(doc.render(), "");
	}

	#[test]
	fn test_single_newline() {
		let doc = Document::parse("\n");
		assert_eq!(doc.lines, vec![""]);
		assert_eq!(doc.render(), "\n");
	}

	#[test]
	fn test_with_lines_keeps_layout() {
		let doc = Document::parse("a\r\nb");
		let rewritten = doc.with_lines(vec!["x".to_string(), "y".to_string()]);
		assert_eq!(rewritten.render(), "x\r\ny");
	}
}
