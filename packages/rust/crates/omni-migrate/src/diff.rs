//! Diff generation utilities.
//!
//! Provides unified diff output for rewrites using the `similar` crate.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Generate a unified diff between two strings, with `a/` and `b/` headers.
///
/// Returns an empty string when nothing changed.
#[must_use]
pub fn generate_unified_diff(original: &str, modified: &str, path: &str) -> String {
    if original == modified {
        return String::new();
    }
    let diff = TextDiff::from_lines(original, modified);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(3)
        .header(&format!("a/{path}"), &format!("b/{path}"));
    unified.to_string()
}

/// Side of a changed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    /// Present only in the original
    Removed,
    /// Present only in the rewrite
    Added,
}

/// One changed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    /// Removed or added
    pub tag: LineTag,
    /// 1-based line in the side the line belongs to
    pub line: usize,
    /// Line content without its newline
    pub content: String,
}

/// Removed and added lines, in diff order.
#[must_use]
pub fn changed_lines(original: &str, modified: &str) -> Vec<LineChange> {
    let diff = TextDiff::from_lines(original, modified);
    diff.iter_all_changes()
        .filter_map(|change| {
            let (tag, index) = match change.tag() {
                ChangeTag::Delete => (LineTag::Removed, change.old_index()?),
                ChangeTag::Insert => (LineTag::Added, change.new_index()?),
                ChangeTag::Equal => return None,
            };
            Some(LineChange {
                tag,
                line: index + 1,
                content: change.value().trim_end_matches(['\r', '\n']).to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_diff() {
        let original = "line1\ndf.sort('A')\nline3\n";
        let modified = "line1\ndf.sort_values('A')\nline3\n";
        let diff = generate_unified_diff(original, modified, "pkg/mod.py");

        assert!(diff.contains("--- a/pkg/mod.py"));
        assert!(diff.contains("+++ b/pkg/mod.py"));
        assert!(diff.contains("-df.sort('A')"));
        assert!(diff.contains("+df.sort_values('A')"));
    }

    #[test]
    fn test_no_changes() {
        assert!(generate_unified_diff("same\n", "same\n", "x.py").is_empty());
        assert!(changed_lines("same\n", "same\n").is_empty());
    }

    #[test]
    fn test_changed_lines() {
        let changes = changed_lines("a\nb\nc\n", "a\nB\nc\nd\n");
        assert_eq!(
            changes,
            vec![
                LineChange {
                    tag: LineTag::Removed,
                    line: 2,
                    content: "b".into()
                },
                LineChange {
                    tag: LineTag::Added,
                    line: 2,
                    content: "B".into()
                },
                LineChange {
                    tag: LineTag::Added,
                    line: 4,
                    content: "d".into()
                },
            ]
        );
    }
}
