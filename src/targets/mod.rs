//! Target discovery and processing
//!
//! A run matches the targets glob against the working directory. Every match
//! must be a directory or a zip archive; inside each, the JSON files glob
//! selects the documents to stamp. A document is written back only when its
//! substitution succeeded and changed something.

pub mod archive;

use anyhow::{anyhow, Context, Result};
use glob::MatchOptions;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::StampError;
use crate::observability::telemetry::sanitize_for_log;
use crate::substitution::JsonSubstituter;
use crate::variables::Variables;

/// Something the targets glob matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Directory(PathBuf),
    Archive(PathBuf),
}

impl Target {
    pub fn classify(path: &Path) -> std::result::Result<Self, StampError> {
        if path.is_dir() {
            Ok(Target::Directory(path.to_path_buf()))
        } else if path.is_file() && is_zip(path) {
            Ok(Target::Archive(path.to_path_buf()))
        } else {
            Err(StampError::UnsupportedTarget {
                path: path.to_path_buf(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Target::Directory(p) | Target::Archive(p) => p,
        }
    }
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Paths under `root` matching `pattern`, sorted and deduplicated.
///
/// `*` does not cross directory boundaries; `**` matches any number of
/// directories including none.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let root_str = root
        .to_str()
        .ok_or_else(|| anyhow!("Path is not valid UTF-8: {}", root.display()))?;
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(root_str.trim_end_matches('/')),
        pattern.trim_start_matches("./")
    );
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut paths: Vec<PathBuf> = glob::glob_with(&full, options)
        .with_context(|| format!("Invalid glob pattern '{}'", pattern))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .collect();
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// What happened to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Changed,
    Unchanged,
    Failed,
}

/// Document counters for a directory, an archive or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub scanned: usize,
    pub changed: usize,
    pub failed: usize,
}

impl DirectoryReport {
    pub fn was_substituted(&self) -> bool {
        self.changed > 0
    }

    fn record(&mut self, outcome: FileOutcome) {
        self.scanned += 1;
        match outcome {
            FileOutcome::Changed => self.changed += 1,
            FileOutcome::Failed => self.failed += 1,
            FileOutcome::Unchanged => {}
        }
    }

    fn merge(&mut self, other: DirectoryReport) {
        self.scanned += other.scanned;
        self.changed += other.changed;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub archives_repacked: usize,
    pub documents: DirectoryReport,
    /// Stopped early on a shutdown signal
    pub interrupted: bool,
}

/// Applies one variable mapping to every document of a run.
#[derive(Debug, Clone)]
pub struct Stamper {
    substituter: JsonSubstituter,
    variables: Variables,
    json_files: String,
    temp_root: PathBuf,
    dry_run: bool,
}

impl Stamper {
    pub fn new(substituter: JsonSubstituter, variables: Variables) -> Self {
        let defaults = Config::default();
        Self {
            substituter,
            variables,
            json_files: defaults.discovery.json_files.clone(),
            temp_root: defaults.temp_root(),
            dry_run: false,
        }
    }

    pub fn from_config(config: &Config, variables: Variables) -> Self {
        Self {
            substituter: JsonSubstituter::from_config(config),
            variables,
            json_files: config.discovery.json_files.clone(),
            temp_root: config.temp_root(),
            dry_run: false,
        }
    }

    pub fn with_json_files(mut self, pattern: impl Into<String>) -> Self {
        self.json_files = pattern.into();
        self
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Process every target under `root` matching `targets_pattern`.
    ///
    /// A failed document never stops the run; an unsupported target or an
    /// I/O error does. A shutdown request is honoured between documents.
    pub fn run(&self, root: &Path, targets_pattern: &str) -> Result<RunSummary> {
        let paths = discover(root, targets_pattern)?;
        if paths.is_empty() {
            warn!(
                "No targets matched '{}' in {}",
                sanitize_for_log(targets_pattern),
                root.display()
            );
        }

        let mut summary = RunSummary::default();
        for path in paths {
            if crate::is_shutdown_requested() {
                warn!("Shutdown requested, skipping remaining targets");
                summary.interrupted = true;
                break;
            }

            info!(" ──────────────────────────────────────────────");
            info!("├─ {}", path.strip_prefix(root).unwrap_or(&path).display());

            let (report, repacked) = match Target::classify(&path)? {
                Target::Directory(dir) => (self.process_directory(&dir)?, false),
                Target::Archive(zip) => self.stamp_archive(&zip, crate::is_shutdown_requested)?,
            };

            summary.targets += 1;
            summary.documents.merge(report);
            if repacked {
                summary.archives_repacked += 1;
            }
        }
        if crate::is_shutdown_requested() {
            summary.interrupted = true;
        }
        Ok(summary)
    }

    /// Stamp every JSON file under `dir`.
    pub fn process_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        let mut report = DirectoryReport::default();
        for file in discover(dir, &self.json_files)? {
            if crate::is_shutdown_requested() {
                break;
            }
            if !file.is_file() {
                continue;
            }
            info!("├─── {}", file.strip_prefix(dir).unwrap_or(&file).display());
            report.record(self.process_file(&file)?);
        }
        Ok(report)
    }

    /// Stamp a single document in place.
    pub fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(_) => {
                warn!("Skipping {}: not valid UTF-8", path.display());
                return Ok(FileOutcome::Failed);
            }
        };

        let outcome = self.substituter.substitute(&self.variables, &source);
        if outcome.is_failed() {
            return Ok(FileOutcome::Failed);
        }
        if !outcome.was_substituted {
            return Ok(FileOutcome::Unchanged);
        }

        if self.dry_run {
            info!("Dry run, not writing {}", path.display());
        } else {
            fs::write(path, outcome.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(FileOutcome::Changed)
    }
}
