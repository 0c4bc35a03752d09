//! Line pipeline for md-migrate.
//!
//! This module handles:
//! - The `Rule` contract every rewrite rule implements
//! - Per-file cross-line state with one namespaced slot per stateful rule
//! - First-match-wins evaluation over a file's lines

pub mod context;
pub mod runner;

pub use context::{Fence, FenceState, FrontMatterState, LineContext, StateSlot};
pub use runner::{Pipeline, Rule, RuleError};
