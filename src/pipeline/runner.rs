use crate::error::{MigrateError, Result};
use crate::pipeline::context::{LineContext, StateSlot};
use tracing::debug;

/// Failure raised by a rule while evaluating a line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleError {
	pub message: String,
}

impl RuleError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// A single line-rewriting rule.
///
/// Rules are immutable once built; all cross-line state lives in the
/// [`LineContext`] slot the rule declares.
pub trait Rule: std::fmt::Debug {
	/// Short identifier used in logs and error reports.
	fn name(&self) -> &'static str;

	/// Distinguishes rules that share a name, such as configured substitutions.
	fn label(&self) -> Option<&str> {
		None
	}

	/// Decide whether this rule claims `line`.
	///
	/// `Ok(None)` leaves the line to lower-priority rules. `Ok(Some(text))`
	/// claims it and `text` becomes the output line. The context reflects
	/// every line before this one.
	fn evaluate(&self, line: &str, ctx: &LineContext) -> std::result::Result<Option<String>, RuleError>;

	/// The context slot this rule owns, if it is stateful.
	fn state_slot(&self) -> Option<StateSlot> {
		None
	}

	/// Fill this rule's slot from the whole document before the first line.
	fn prepare(&self, _lines: &[String], _ctx: &mut LineContext) {}

	/// Update this rule's slot after the line's output has been chosen.
	///
	/// Called for every stateful rule on every line, whichever rule claimed it.
	fn advance(&self, _line: &str, _ctx: &mut LineContext) {}
}

/// An ordered rule chain applied with first-match-wins.
#[derive(Debug)]
pub struct Pipeline {
	rules: Vec<Box<dyn Rule>>,
}

impl Pipeline {
	/// Build a pipeline, rejecting rule sets where two rules own the same slot.
	pub fn new(rules: Vec<Box<dyn Rule>>) -> Result<Self> {
		let mut owners: Vec<(StateSlot, &'static str)> = Vec::new();
		for rule in &rules {
			let Some(slot) = rule.state_slot() else {
				continue;
			};
			if let Some((_, first)) = owners.iter().find(|(owned, _)| *owned == slot) {
				return Err(MigrateError::DuplicateStateSlot {
					slot,
					first,
					second: rule.name(),
				});
			}
			owners.push((slot, rule.name()));
		}

		Ok(Pipeline { rules })
	}

	/// Rule names in evaluation order.
	pub fn rule_names(&self) -> Vec<&'static str> {
		self.rules.iter().map(|rule| rule.name()).collect()
	}

	/// Rules in evaluation order.
	pub fn rules(&self) -> &[Box<dyn Rule>] {
		&self.rules
	}

	/// Run every line through the chain.
	///
	/// The output has exactly one line per input line, in the same order.
	/// The first rule error aborts the whole pass.
	pub fn process(&self, lines: &[String]) -> Result<Vec<String>> {
		let mut ctx = LineContext::new();
		let mut output = Vec::with_capacity(lines.len());

		for rule in self.rules.iter().filter(|rule| rule.state_slot().is_some()) {
			rule.prepare(lines, &mut ctx);
		}

		for (line_number, line) in lines.iter().enumerate() {
			ctx.line_number = line_number;

			let mut result = None;
			for rule in &self.rules {
				let claimed = rule
					.evaluate(line, &ctx)
					.map_err(|err| MigrateError::Rule {
						rule: rule.name(),
						line: line_number + 1,
						message: err.message,
					})?;
				if let Some(replacement) = claimed {
					if replacement != *line {
						debug!(rule = rule.name(), line = line_number + 1, "rewrote line");
					}
					result = Some(replacement);
					break;
				}
			}

			for rule in self.rules.iter().filter(|rule| rule.state_slot().is_some()) {
				rule.advance(line, &mut ctx);
			}

			output.push(result.unwrap_or_else(|| line.clone()));
		}

		Ok(output)
	}
}
