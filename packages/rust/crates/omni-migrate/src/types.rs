//! Core types for the migration pipeline.
//!
//! Defines the data structures passed between passes and returned to callers.
//! Everything a caller sees derives `Serialize` so reports can be rendered as JSON.

use std::collections::BTreeSet;

use omni_ast::{StructureSummary, SyntaxFault};
use serde::{Deserialize, Serialize};

use crate::diff::generate_unified_diff;
use crate::error::MigrateError;
use crate::rule::ImportRequirement;

/// How likely a rewrite is to need human review. Informational only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    /// Mechanical rename.
    #[default]
    Low,
    /// Semantics preserved under a heuristic.
    Medium,
    /// Routes to a different library or changes call shape.
    High,
}

/// One entry of the change log.
///
/// Appended in pipeline order and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    /// Rule (or handler fragment) that produced the change.
    pub rule_name: String,
    /// Human description of the rewrite.
    pub description: String,
    /// Number of sites rewritten (0 for error records).
    pub count: usize,
    /// Risk of the producing rule.
    pub risk: Risk,
    /// 1-based lines of the rewritten sites, ascending.
    pub lines: Vec<usize>,
    /// Set when a site could not be rewritten and was left untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChangeRecord {
    /// Whether this record reports a per-site failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Classification state of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    /// Uses pandas, but nothing deprecated (or only allow-listed constructs).
    AlreadyCompatible,
    /// At least one deprecated API signature was detected.
    NeedsRewrite,
    /// Does not use pandas at all.
    NotApplicable,
}

/// Result of classifying a file. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileClassification {
    /// Classification state.
    pub state: Compatibility,
    /// Convenience flag, `state == NeedsRewrite`.
    pub needs_rewrite: bool,
    /// Why the classifier reached its verdict.
    pub reason: String,
    /// Names of the rules whose signatures matched.
    pub detected_apis: BTreeSet<String>,
    /// Allow-listed signatures present in the file.
    pub protected: Vec<String>,
}

/// Verdict of the post-rewrite parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyntaxVerdict {
    /// Rewritten text parses.
    Valid,
    /// Rewritten text fails to parse although the input parsed.
    Regression {
        /// First fault in the rewritten text
        fault: SyntaxFault,
    },
    /// Input already failed to parse; nothing is applied.
    InputInvalid {
        /// First fault in the input
        fault: SyntaxFault,
    },
    /// The file was not rewritten (not applicable or allow-listed).
    Skipped,
}

/// Non-fatal warning: definition counts changed across the rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralIntegrityWarning {
    /// Counts before the rewrite
    pub before: StructureSummary,
    /// Counts after the rewrite
    pub after: StructureSummary,
    /// Summary of the difference
    pub message: String,
}

/// Outcome of validating a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Parse verdict
    pub verdict: SyntaxVerdict,
    /// Structural warning, only computed when the rewritten text parses
    pub structure: Option<StructuralIntegrityWarning>,
}

impl ValidationReport {
    pub(crate) fn skipped() -> Self {
        Self {
            verdict: SyntaxVerdict::Skipped,
            structure: None,
        }
    }

    /// Whether the rewritten text must be discarded.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.verdict,
            SyntaxVerdict::Regression { .. } | SyntaxVerdict::InputInvalid { .. }
        )
    }
}

/// Output of one rewriting pass (simple or contextual).
#[derive(Debug, Clone, Default)]
pub struct PassOutput {
    /// Text after the pass
    pub text: String,
    /// Change records in application order
    pub changes: Vec<ChangeRecord>,
    /// Imports required by the rules and fragments that fired
    pub requires: Vec<ImportRequirement>,
}

/// What [`crate::RewritePipeline::rewrite`] hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    /// Final text: rewritten when `applied`, otherwise the input byte-for-byte.
    pub text: String,
    /// Ordered change log (including error-flagged records).
    pub changes: Vec<ChangeRecord>,
    /// Post-rewrite validation.
    pub validation: ValidationReport,
    /// Classification computed before rewriting.
    pub classification: FileClassification,
    /// Whether the rewritten text was kept.
    pub applied: bool,
}

impl RewriteOutcome {
    /// Number of rewritten sites across all successful records.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| !change.is_error())
            .map(|change| change.count)
            .sum()
    }

    /// Error-flagged records (sites left untouched).
    pub fn errors(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(|change| change.is_error())
    }

    /// Whether the returned text differs from `original`.
    #[must_use]
    pub fn is_modified(&self, original: &str) -> bool {
        self.applied && self.text != original
    }

    /// Unified diff from `original` to the returned text.
    #[must_use]
    pub fn diff(&self, original: &str, path: &str) -> String {
        generate_unified_diff(original, &self.text, path)
    }

    /// The text, or the syntax regression that prevented applying it.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::SyntaxRegression`] when the rewrite broke parsing.
    pub fn ensure_valid(self) -> Result<String, MigrateError> {
        match self.validation.verdict {
            SyntaxVerdict::Regression { fault } => Err(MigrateError::SyntaxRegression {
                line: fault.line,
                column: fault.column,
                message: fault.message,
            }),
            _ => Ok(self.text),
        }
    }
}
