//! Error types for the rewrite engine.
//!
//! Follows ODF-REP: Library crates use `thiserror` for explicit error enums.

use thiserror::Error;

/// Error types for catalog construction, configuration and validation.
///
/// Each variant represents a specific failure mode of the migration pipeline.
/// Per-site transformation failures are not errors at this level: they are
/// recorded as error-flagged change records and the site is left untouched.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// A rule's detection pattern failed to compile.
    #[error("Detection error in rule '{rule}': {source}")]
    Detection {
        /// Rule whose pattern is invalid
        rule: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Two rules share a name.
    #[error("Duplicate rule name: {0}")]
    DuplicateRule(String),

    /// A rule definition is incomplete or inconsistent.
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule {
        /// Rule name (may be empty)
        rule: String,
        /// What is wrong with it
        reason: String,
    },

    /// Configuration or rule spec JSON could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// The Python grammar could not be loaded.
    #[error("Parser error: {0}")]
    Parser(String),

    /// The rewritten text no longer parses although the original did.
    #[error("Syntax regression at line {line}, column {column}: {message}")]
    SyntaxRegression {
        /// 1-based line of the first fault
        line: usize,
        /// 1-based column of the first fault
        column: usize,
        /// Parser message
        message: String,
    },
}

/// Failure to rewrite one match site.
///
/// The site stays unmodified; the message ends up in the change log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    /// Create a transformation error with a human-readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reason the site could not be rewritten.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
