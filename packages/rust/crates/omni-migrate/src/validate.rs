//! Post-rewrite validation: does it still parse, and did code disappear?

use omni_ast::{StructureSummary, SyntaxCheck, SyntaxFault, check_syntax};
use tracing::warn;

use crate::types::{StructuralIntegrityWarning, SyntaxVerdict, ValidationReport};

/// Parses rewritten text and compares definition counts with the original.
pub struct SyntaxValidator;

impl SyntaxValidator {
    /// Validate `rewritten` against `original`.
    #[must_use]
    pub fn validate(original: &str, rewritten: &str) -> ValidationReport {
        let fault = match check(rewritten) {
            SyntaxCheck::Valid => None,
            SyntaxCheck::Invalid { fault } => Some(fault),
        };
        if let Some(fault) = fault {
            let verdict = match check(original) {
                SyntaxCheck::Valid => SyntaxVerdict::Regression { fault },
                SyntaxCheck::Invalid { fault } => SyntaxVerdict::InputInvalid { fault },
            };
            return ValidationReport {
                verdict,
                structure: None,
            };
        }

        ValidationReport {
            verdict: SyntaxVerdict::Valid,
            structure: structural_warning(original, rewritten),
        }
    }
}

fn check(code: &str) -> SyntaxCheck {
    check_syntax(code).unwrap_or_else(|err| SyntaxCheck::Invalid {
        fault: SyntaxFault {
            line: 0,
            column: 0,
            message: format!("parser unavailable: {err}"),
        },
    })
}

fn structural_warning(original: &str, rewritten: &str) -> Option<StructuralIntegrityWarning> {
    let before = StructureSummary::of(original).ok()?;
    let after = StructureSummary::of(rewritten).ok()?;
    if before == after {
        return None;
    }
    let message = format!(
        "definition counts changed: functions {} -> {}, classes {} -> {}",
        before.functions, after.functions, before.classes, after.classes
    );
    warn!(%message, "structural integrity check failed");
    Some(StructuralIntegrityWarning {
        before,
        after,
        message,
    })
}
