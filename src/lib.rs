//! md-migrate - CLI tool for migrating Jekyll Markdown posts to Pelican.
//!
//! This library provides the core functionality for md-migrate, including:
//! - A first-match-wins line pipeline with per-file context
//! - The Jekyll to Pelican rewrite rules and their factory
//! - Configuration file parsing and cascade discovery
//! - The per-file backup and atomic rewrite protocol
//!
//! # Example
//!
//! ```no_run
//! use md_migrate::config::load_merged_config;
//! use md_migrate::migrate::{MigrateOptions, Migrator};
//! use std::path::Path;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let settings = load_merged_config(&cwd).unwrap().settings();
//! let migrator = Migrator::new(settings);
//!
//! let report = migrator
//!     .migrate_file(Path::new("_posts/2023-01-05-my-post.md"), MigrateOptions::default())
//!     .unwrap();
//! println!("{} lines changed", report.changed_lines);
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod migrate;
pub mod pipeline;
pub mod rules;

pub use error::{MigrateError, Result};
