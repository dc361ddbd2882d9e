//! Parse checks with fault location.

use anyhow::Result;
use serde::Serialize;
use tree_sitter::Node;

use crate::parser::{for_each_node, node_text, parse};

/// First syntax fault found in a source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxFault {
    /// 1-based line
    pub line: usize,
    /// 1-based column (bytes)
    pub column: usize,
    /// Short description of the fault
    pub message: String,
}

/// Result of [`check_syntax`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyntaxCheck {
    /// The text parses without error or missing nodes.
    Valid,
    /// The text does not parse; carries the first fault in document order.
    Invalid {
        /// Location and description of the fault
        fault: SyntaxFault,
    },
}

impl SyntaxCheck {
    /// Whether the text parsed cleanly.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The fault, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&SyntaxFault> {
        match self {
            Self::Valid => None,
            Self::Invalid { fault } => Some(fault),
        }
    }
}

/// Parse `code` and report the first fault.
///
/// # Errors
///
/// Fails only when the Python grammar cannot be loaded.
pub fn check_syntax(code: &str) -> Result<SyntaxCheck> {
    let tree = parse(code)?;
    let root = tree.root_node();
    if !root.has_error() {
        return Ok(SyntaxCheck::Valid);
    }

    let mut first: Option<Node<'_>> = None;
    for_each_node(root, |node| {
        if first.is_none() && (node.is_error() || node.is_missing()) {
            first = Some(node);
        }
    });

    let fault = match first {
        Some(node) => fault_at(&node, code),
        None => SyntaxFault {
            line: 1,
            column: 1,
            message: "invalid syntax".to_string(),
        },
    };
    Ok(SyntaxCheck::Invalid { fault })
}

fn fault_at(node: &Node<'_>, code: &str) -> SyntaxFault {
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = node_text(node, code)
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(40)
            .collect();
        if snippet.trim().is_empty() {
            "invalid syntax".to_string()
        } else {
            format!("invalid syntax near `{}`", snippet.trim())
        }
    };
    SyntaxFault {
        line: position.row + 1,
        column: position.column + 1,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_source() {
        let check = check_syntax("import pandas as pd\ndf = pd.DataFrame()\n").expect("check");
        assert!(check.is_valid());
        assert!(check.fault().is_none());
    }

    #[test]
    fn test_unclosed_call_reports_fault() {
        let check = check_syntax("x = 1\ndf.sort_values(('A')\n").expect("check");
        let fault = check.fault().expect("fault");
        assert!(fault.line >= 2, "fault should be on or after line 2: {fault:?}");
    }
}
