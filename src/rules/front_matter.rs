use crate::error::Result;
use crate::pipeline::{FrontMatterState, LineContext, Rule, RuleError, StateSlot};
use crate::rules::compile_regex;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Target keys whose values are parsed as dates.
const DATE_KEYS: &[&str] = &["date", "modified"];

/// Translates the YAML front matter of a Jekyll post into Pelican metadata.
///
/// The header starts with `---` on the first line and ends at the next `---`.
/// Every header line is claimed, unchanged when nothing applies, so content
/// rules never see metadata.
#[derive(Debug)]
pub struct FrontMatterRule {
	rename: BTreeMap<String, String>,
	keep_time: bool,
	key_re: Regex,
	item_re: Regex,
	date_re: Regex,
}

impl FrontMatterRule {
	pub fn new(rename: BTreeMap<String, String>, keep_time: bool) -> Result<Self> {
		Ok(FrontMatterRule {
			rename,
			keep_time,
			key_re: compile_regex(r"^([A-Za-z0-9_][A-Za-z0-9_-]*):(?:[ \t]+(.*?))?[ \t]*$")?,
			item_re: compile_regex(r"^[ \t]*-[ \t]+(.+?)[ \t]*$")?,
			date_re: compile_regex(
				r"^(\d{4}-\d{2}-\d{2})(?:[ T](\d{2}:\d{2}(?::\d{2})?)(?:\.\d+)?)?[ \t]*(Z|[+-]\d{2}:?\d{2})?$",
			)?,
		})
	}

	/// Rewrite a header spanning `header[0]` to the closing delimiter, inclusive.
	///
	/// Block lists are folded into their key line as `key: a, b`, the form
	/// Pelican reads as one value. The output keeps the header's length by
	/// padding blank lines after the closing delimiter.
	fn plan_header(
		&self,
		header: &[String],
	) -> std::result::Result<Vec<String>, (usize, RuleError)> {
		let (Some((open, _)), Some((close, _))) = (header.split_first(), header.split_last())
		else {
			return Ok(Vec::new());
		};

		let mut out = vec![open.clone()];
		let mut current_key: Option<String> = None;
		let mut list: Option<BlockList> = None;

		for (line_number, line) in header.iter().enumerate().take(header.len() - 1).skip(1) {
			if let Some(caps) = self.key_re.captures(line) {
				fold(&mut out, list.take());

				let key = &caps[1];
				let value = caps.get(2).map_or("", |m| m.as_str());
				let target_key = self.rename.get(key).map_or(key, String::as_str);
				if value.is_empty() {
					list = Some(BlockList {
						index: out.len(),
						key: target_key.to_string(),
						items: Vec::new(),
					});
				}
				current_key = Some(key.to_string());

				let translated = self
					.translate_field(line, key, target_key, value)
					.map_err(|err| (line_number, err))?;
				out.push(translated);
				continue;
			}

			if let Some(caps) = self.item_re.captures(line) {
				let Some(list) = list.as_mut() else {
					let message = match &current_key {
						Some(key) => format!(
							"list item '{}' under '{key}', which already has a value",
							line.trim()
						),
						None => format!("list item '{}' appears before any key", line.trim()),
					};
					return Err((line_number, RuleError::new(message)));
				};
				let item = unquote(&caps[1])
					.map_err(|err| (line_number, err))?
					.unwrap_or_else(|| caps[1].to_string());
				list.items.push(item);
				continue;
			}

			out.push(line.clone());
		}
		fold(&mut out, list);

		out.push(close.clone());
		out.resize(header.len(), String::new());
		Ok(out)
	}

	fn translate_field(
		&self,
		line: &str,
		key: &str,
		target_key: &str,
		value: &str,
	) -> std::result::Result<String, RuleError> {
		let target_value = self.translate_value(target_key, value)?;

		if target_key == key && target_value == value {
			return Ok(line.to_string());
		}
		debug!(key, target_key, "translated front-matter field");
		Ok(if target_value.is_empty() {
			format!("{target_key}:")
		} else {
			format!("{target_key}: {target_value}")
		})
	}

	fn translate_value(
		&self,
		target_key: &str,
		value: &str,
	) -> std::result::Result<String, RuleError> {
		if DATE_KEYS.contains(&target_key)
			&& let Some(caps) = self.date_re.captures(value)
		{
			let date = &caps[1];
			return Ok(match caps.get(2) {
				Some(time) if self.keep_time => format!("{date} {}", time.as_str()),
				_ => date.to_string(),
			});
		}

		if let Some(inner) = value
			.strip_prefix('[')
			.and_then(|rest| rest.strip_suffix(']'))
		{
			return Ok(parse_flow_list(inner)?.join(", "));
		}

		Ok(unquote(value)?.unwrap_or_else(|| value.to_string()))
	}
}

/// Items collected under a `key:` line with no inline value.
struct BlockList {
	/// Position of the key line in the rewritten header.
	index: usize,
	key: String,
	items: Vec<String>,
}

fn fold(out: &mut [String], list: Option<BlockList>) {
	let Some(list) = list.filter(|list| !list.items.is_empty()) else {
		return;
	};
	debug!(key = %list.key, items = list.items.len(), "folded block list");
	out[list.index] = format!("{}: {}", list.key, list.items.join(", "));
}

fn is_delimiter(line: &str) -> bool {
	line.trim_start_matches('\u{feff}').trim_end() == "---"
}

/// Strip YAML quotes from a fully quoted scalar.
///
/// Returns `Ok(None)` when the value is not a single quoted scalar, so
/// already-plain values are left alone.
fn unquote(value: &str) -> std::result::Result<Option<String>, RuleError> {
	let mut chars = value.chars();
	let quote = match chars.next() {
		Some(q @ ('"' | '\'')) if value.len() >= 2 && value.ends_with(q) => q,
		_ => return Ok(None),
	};
	let inner = &value[1..value.len() - 1];

	let mut out = String::with_capacity(inner.len());
	let mut iter = inner.chars().peekable();
	while let Some(c) = iter.next() {
		match (quote, c) {
			('"', '\\') => match iter.next() {
				Some('"') => out.push('"'),
				Some('\\') => out.push('\\'),
				Some(other) => {
					out.push('\\');
					out.push(other);
				}
				None => return Err(RuleError::new(format!("dangling escape in {value}"))),
			},
			('\'', '\'') if iter.peek() == Some(&'\'') => {
				iter.next();
				out.push('\'');
			}
			// An unescaped quote means this is not one scalar, e.g. `"a" and "b"`
			(q, c) if c == q => return Ok(None),
			_ => out.push(c),
		}
	}

	Ok(Some(out))
}

/// Split the inside of a YAML flow sequence, honouring quoted items.
fn parse_flow_list(inner: &str) -> std::result::Result<Vec<String>, RuleError> {
	let mut items = Vec::new();
	let mut current = String::new();
	let mut quote: Option<char> = None;

	for c in inner.chars() {
		match (quote, c) {
			(None, ',') => items.push(std::mem::take(&mut current)),
			(None, '"' | '\'') => {
				quote = Some(c);
				current.push(c);
			}
			(Some(q), c) if c == q => {
				quote = None;
				current.push(c);
			}
			_ => current.push(c),
		}
	}
	if quote.is_some() {
		return Err(RuleError::new(format!("unterminated quote in list [{inner}]")));
	}
	items.push(current);

	let mut result = Vec::with_capacity(items.len());
	for item in items {
		let item = item.trim();
		if item.is_empty() {
			continue;
		}
		result.push(unquote(item)?.unwrap_or_else(|| item.to_string()));
	}
	Ok(result)
}

impl Rule for FrontMatterRule {
	fn name(&self) -> &'static str {
		"front-matter"
	}

	fn evaluate(
		&self,
		_line: &str,
		ctx: &LineContext,
	) -> std::result::Result<Option<String>, RuleError> {
		if let Some((line_number, err)) = &ctx.front_matter.error
			&& *line_number == ctx.line_number
		{
			return Err(err.clone());
		}
		Ok(ctx.front_matter.planned.get(ctx.line_number).cloned())
	}

	fn state_slot(&self) -> Option<StateSlot> {
		Some(StateSlot::FrontMatter)
	}

	fn prepare(&self, lines: &[String], ctx: &mut LineContext) {
		// Like Jekyll, a header that is never closed is not a header
		let close = match lines.first() {
			Some(first) if is_delimiter(first) => {
				lines.iter().skip(1).position(|line| is_delimiter(line))
			}
			_ => None,
		};
		let Some(close) = close.map(|offset| offset + 1) else {
			return;
		};

		let header = &lines[..=close];
		ctx.front_matter = match self.plan_header(header) {
			Ok(planned) => FrontMatterState {
				planned,
				error: None,
			},
			Err(error) => FrontMatterState {
				planned: header.to_vec(),
				error: Some(error),
			},
		};
	}
}
