//! Batch Migration - parallel rewriting of many sources.
//!
//! The caller reads the files; the pipeline rewrites them concurrently with
//! rayon and hands back the new texts. Nothing is written to disk here.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::RewritePipeline;
use crate::filter::is_safe_to_modify;
use crate::types::{RewriteOutcome, SyntaxVerdict};

/// One source handed to [`RewritePipeline::process_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path used for filtering and reporting
    pub path: PathBuf,
    /// Current file contents
    pub text: String,
}

impl SourceFile {
    /// Create a source entry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Aggregate result of a batch run. Maps are keyed by display path.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Number of files the pipeline looked at (skipped paths excluded)
    pub files_scanned: usize,
    /// Number of files whose text changed
    pub files_changed: usize,
    /// Total rewritten sites across changed files
    pub replacements: usize,
    /// Paths rejected by the path filter (path -> reason)
    pub skipped: BTreeMap<String, String>,
    /// Files whose rewrite was discarded (path -> reason)
    pub failures: BTreeMap<String, String>,
    /// Outcome per scanned file
    pub outcomes: BTreeMap<String, RewriteOutcome>,
}

impl BatchReport {
    /// Paths and new texts of the files that changed.
    pub fn modified(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.applied && outcome.total_changes() > 0)
            .map(|(path, outcome)| (path.as_str(), outcome.text.as_str()))
    }
}

impl RewritePipeline {
    /// Process `files` in parallel.
    ///
    /// Each file goes through the path filter first, then [`RewritePipeline::process`].
    #[must_use]
    pub fn process_batch(&self, files: Vec<SourceFile>) -> BatchReport {
        let files_scanned = AtomicUsize::new(0);
        let files_changed = AtomicUsize::new(0);
        let total_replacements = AtomicUsize::new(0);
        let skipped: DashMap<String, String> = DashMap::new();
        let failures: DashMap<String, String> = DashMap::new();
        let outcomes: DashMap<String, RewriteOutcome> = DashMap::new();

        files.into_par_iter().for_each(|file| {
            let key = file.path.display().to_string();
            if let Err(reason) = is_safe_to_modify(&file.path) {
                skipped.insert(key, reason.to_string());
                return;
            }
            files_scanned.fetch_add(1, Ordering::Relaxed);

            let outcome = self.process(&file.text);
            match &outcome.validation.verdict {
                SyntaxVerdict::Regression { fault } => {
                    failures.insert(
                        key.clone(),
                        format!(
                            "rewrite broke parsing at {}:{}: {}",
                            fault.line, fault.column, fault.message
                        ),
                    );
                }
                SyntaxVerdict::InputInvalid { fault } => {
                    failures.insert(
                        key.clone(),
                        format!(
                            "input does not parse at {}:{}: {}",
                            fault.line, fault.column, fault.message
                        ),
                    );
                }
                SyntaxVerdict::Valid | SyntaxVerdict::Skipped => {}
            }
            if outcome.is_modified(&file.text) {
                files_changed.fetch_add(1, Ordering::Relaxed);
                total_replacements.fetch_add(outcome.total_changes(), Ordering::Relaxed);
            }
            outcomes.insert(key, outcome);
        });

        let report = BatchReport {
            files_scanned: files_scanned.load(Ordering::Relaxed),
            files_changed: files_changed.load(Ordering::Relaxed),
            replacements: total_replacements.load(Ordering::Relaxed),
            skipped: skipped.into_iter().collect(),
            failures: failures.into_iter().collect(),
            outcomes: outcomes.into_iter().collect(),
        };
        info!(
            scanned = report.files_scanned,
            changed = report.files_changed,
            replacements = report.replacements,
            skipped = report.skipped.len(),
            failures = report.failures.len(),
            "batch migration finished"
        );
        report
    }
}
