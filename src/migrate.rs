//! Per-file migration protocol.
//!
//! For each file:
//! - Read it and reject anything that is not readable UTF-8 text
//! - Copy the original bytes to `<path>.backup`
//! - Run a freshly built pipeline over its lines
//! - Write the result to a temp file and rename it over the original

use crate::config::Settings;
use crate::document::Document;
use crate::error::{MigrateError, Result};
use crate::rules::create_pipeline;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for a single migration run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
	/// Compute the result without writing a backup or the rewritten file.
	pub dry_run: bool,
}

/// Outcome of migrating one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
	pub path: PathBuf,

	/// Where the original was copied, `None` on a dry run.
	pub backup: Option<PathBuf>,

	/// Number of lines in the file.
	pub lines: usize,

	/// Number of lines whose content changed.
	pub changed_lines: usize,
}

/// Runs the migration protocol with one set of settings.
#[derive(Debug, Clone)]
pub struct Migrator {
	settings: Settings,
}

impl Migrator {
	pub fn new(settings: Settings) -> Self {
		Migrator { settings }
	}

	/// Migrate one file in place.
	///
	/// On an input error nothing is written. Once the backup exists, any
	/// later failure leaves it as the recovery copy.
	pub fn migrate_file(&self, path: &Path, options: MigrateOptions) -> Result<FileReport> {
		let original = read_input(path)?;
		let text = std::str::from_utf8(&original).map_err(|_| MigrateError::NotUtf8 {
			path: path.to_path_buf(),
		})?;

		let backup = if options.dry_run {
			None
		} else {
			Some(write_backup(path, &original)?)
		};

		let document = Document::parse(text);
		let pipeline = create_pipeline(&self.settings)?;
		let lines = pipeline.process(&document.lines)?;

		let changed_lines = document
			.lines
			.iter()
			.zip(&lines)
			.filter(|(before, after)| before != after)
			.count();
		debug!(path = %path.display(), changed_lines, "processed file");

		if !options.dry_run {
			let rewritten = document.with_lines(lines).render();
			write_atomically(path, rewritten.as_bytes())?;
			info!(path = %path.display(), changed_lines, "migrated file");
		}

		Ok(FileReport {
			path: path.to_path_buf(),
			backup,
			lines: document.lines.len(),
			changed_lines,
		})
	}

	/// Migrate several files, continuing past failures.
	///
	/// Results are returned in input order, one per path.
	pub fn migrate_all(
		&self,
		paths: &[PathBuf],
		options: MigrateOptions,
	) -> Vec<(PathBuf, Result<FileReport>)> {
		paths
			.iter()
			.map(|path| {
				let result = self.migrate_file(path, options);
				if let Err(ref e) = result {
					warn!(path = %path.display(), error = %e, "migration failed");
				}
				(path.clone(), result)
			})
			.collect()
	}
}

/// `<path>.backup`, next to the original.
pub fn backup_path(path: &Path) -> PathBuf {
	let mut name = OsString::from(path.as_os_str());
	name.push(".backup");
	PathBuf::from(name)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
	let metadata = std::fs::metadata(path).map_err(|source| MigrateError::Input {
		path: path.to_path_buf(),
		source,
	})?;
	if !metadata.is_file() {
		return Err(MigrateError::NotAFile {
			path: path.to_path_buf(),
		});
	}

	std::fs::read(path).map_err(|source| MigrateError::Input {
		path: path.to_path_buf(),
		source,
	})
}

fn write_backup(path: &Path, original: &[u8]) -> Result<PathBuf> {
	let backup = backup_path(path);
	std::fs::write(&backup, original).map_err(|source| MigrateError::Backup {
		path: backup.clone(),
		source,
	})?;
	debug!(backup = %backup.display(), "wrote backup");
	Ok(backup)
}

/// Replace `path` without ever leaving it half-written.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
	let write_error = |source: std::io::Error| MigrateError::Write {
		path: path.to_path_buf(),
		source,
	};

	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
	temp.write_all(contents).map_err(write_error)?;
	temp.as_file().sync_all().map_err(write_error)?;

	let permissions = std::fs::metadata(path).map_err(write_error)?.permissions();
	std::fs::set_permissions(temp.path(), permissions).map_err(write_error)?;

	temp.persist(path).map_err(|e| write_error(e.error))?;
	Ok(())
}

/// Expand command-line patterns into the files to migrate.
///
/// Every pattern must end with `.md`. Literal paths that do not exist are
/// kept so the migrator reports them as input errors. Duplicates are
/// dropped, keeping the first occurrence.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
	let mut paths: Vec<PathBuf> = Vec::new();

	for pattern in patterns {
		if !pattern.ends_with(".md") {
			return Err(MigrateError::InvalidPattern {
				pattern: pattern.clone(),
				reason: "pattern must end with .md".to_string(),
			});
		}

		let matches: Vec<PathBuf> = if is_literal(pattern) {
			vec![PathBuf::from(pattern)]
		} else {
			let entries = glob::glob(pattern).map_err(|e| MigrateError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.msg.to_string(),
			})?;
			entries
				.filter_map(|entry| match entry {
					Ok(path) => Some(path),
					Err(e) => {
						warn!(path = %e.path().display(), "skipping unreadable match");
						None
					}
				})
				.collect()
		};

		if matches.is_empty() {
			warn!(pattern = %pattern, "pattern matched no files");
		}

		for path in matches {
			if !paths.contains(&path) {
				paths.push(path);
			}
		}
	}

	Ok(paths)
}

fn is_literal(pattern: &str) -> bool {
	!pattern.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	const POST: &str = "---\ntitle: \"Hi\"\ndate: 2023-01-05 10:00:00 -0500\n---\nSee [a]({% post_url 2023-01-01-a %}).\n";

	fn migrator() -> Migrator {
		Migrator::new(Settings::default())
	}

	#[test]
	fn test_backup_path() {
		assert_eq!(
			backup_path(Path::new("posts/a.md")),
			PathBuf::from("posts/a.md.backup")
		);
	}

	#[test]
	fn test_migrate_file_rewrites_and_backs_up() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("post.md");
		fs::write(&path, POST).unwrap();

		let report = migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap();

		assert_eq!(report.lines, 5);
		assert_eq!(report.changed_lines, 3);
		assert_eq!(report.backup, Some(temp_dir.path().join("post.md.backup")));
		assert_eq!(
			fs::read_to_string(&path).unwrap(),
			"---\ntitle: Hi\ndate: 2023-01-05\n---\nSee [a]({filename}/2023-01-01-a.md).\n"
		);
		assert_eq!(
			fs::read_to_string(temp_dir.path().join("post.md.backup")).unwrap(),
			POST
		);
	}

	#[test]
	fn test_dry_run_writes_nothing() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("post.md");
		fs::write(&path, POST).unwrap();

		let report = migrator()
			.migrate_file(&path, MigrateOptions { dry_run: true })
			.unwrap();

		assert_eq!(report.changed_lines, 3);
		assert!(report.backup.is_none());
		assert_eq!(fs::read_to_string(&path).unwrap(), POST);
		assert!(!backup_path(&path).exists());
	}

	#[test]
	fn test_missing_file_is_input_error_without_backup() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("missing.md");

		let err = migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap_err();

		assert!(matches!(err, MigrateError::Input { .. }));
		assert!(!backup_path(&path).exists());
	}

	#[test]
	fn test_directory_is_not_a_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("dir.md");
		fs::create_dir(&path).unwrap();

		let err = migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap_err();
		assert!(matches!(err, MigrateError::NotAFile { .. }));
	}

	#[test]
	fn test_binary_file_is_rejected_without_backup() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("bad.md");
		fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

		let err = migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap_err();
		assert!(matches!(err, MigrateError::NotUtf8 { .. }));
		assert!(!backup_path(&path).exists());
	}

	#[test]
	fn test_rule_error_keeps_original_and_backup() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("broken.md");
		let content = "intro\n[x]({% post_url %})\n";
		fs::write(&path, content).unwrap();

		let err = migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap_err();

		assert!(matches!(err, MigrateError::Rule { line: 2, .. }));
		assert_eq!(fs::read_to_string(&path).unwrap(), content);
		assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), content);
	}

	#[test]
	fn test_rerun_refreshes_backup() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("post.md");
		fs::write(&path, POST).unwrap();

		migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap();
		let migrated = fs::read_to_string(&path).unwrap();

		let report = migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap();
		assert_eq!(report.changed_lines, 0);
		assert_eq!(fs::read_to_string(&path).unwrap(), migrated);
		assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), migrated);
	}

	#[test]
	fn test_crlf_and_missing_final_newline_preserved() {
		let temp_dir = tempfile::tempdir().unwrap();
		let path = temp_dir.path().join("win.md");
		fs::write(&path, "{:toc}\r\ntext").unwrap();

		migrator()
			.migrate_file(&path, MigrateOptions::default())
			.unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "[TOC]\r\ntext");
	}

	#[test]
	fn test_migrate_all_continues_after_failure() {
		let temp_dir = tempfile::tempdir().unwrap();
		let good = temp_dir.path().join("good.md");
		let missing = temp_dir.path().join("missing.md");
		fs::write(&good, "{:toc}\n").unwrap();

		let results = migrator().migrate_all(
			&[missing.clone(), good.clone()],
			MigrateOptions::default(),
		);

		assert_eq!(results.len(), 2);
		assert_eq!(results[0].0, missing);
		assert!(results[0].1.is_err());
		assert!(results[1].1.is_ok());
		assert_eq!(fs::read_to_string(&good).unwrap(), "[TOC]\n");
	}

	#[test]
	fn test_expand_patterns_requires_md() {
		let result = expand_patterns(&["notes.txt".to_string()]);
		assert!(matches!(result, Err(MigrateError::InvalidPattern { .. })));
	}

	#[test]
	fn test_expand_patterns_glob_and_dedup() {
		let temp_dir = tempfile::tempdir().unwrap();
		fs::write(temp_dir.path().join("a.md"), "").unwrap();
		fs::write(temp_dir.path().join("b.md"), "").unwrap();
		fs::write(temp_dir.path().join("c.txt"), "").unwrap();

		let glob = format!("{}/*.md", temp_dir.path().display());
		let literal = temp_dir.path().join("a.md").display().to_string();
		let paths = expand_patterns(&[literal, glob]).unwrap();

		assert_eq!(
			paths,
			vec![temp_dir.path().join("a.md"), temp_dir.path().join("b.md")]
		);
	}

	#[test]
	fn test_expand_patterns_keeps_missing_literal() {
		let paths = expand_patterns(&["does/not/exist.md".to_string()]).unwrap();
		assert_eq!(paths, vec![PathBuf::from("does/not/exist.md")]);
	}
}
