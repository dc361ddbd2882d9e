//! `A - A[key]` to `A.sub(A[key], axis=0)`, row-aligned subtraction.
//!
//! Only rewritten when precedence guarantees the match is the whole operand:
//! nothing binding tighter than `-` may sit on either side.

use super::args::{matching_close, opening_bracket, split_top_level};
use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::matcher::MatchSite;

pub(crate) struct BinarySubtraction;

/// Characters after which an expression may start with `A - ...` unchanged.
const OPEN_CONTEXT: &[u8] = b"=(,[{:;<>!";

const LOOSER_KEYWORDS: &[&str] = &[
    "return", "yield", "and", "or", "not", "in", "is", "if", "else", "assert",
];

/// Characters that, following `A[key]`, bind tighter than binary minus.
const TIGHTER_FOLLOWERS: &[u8] = b"*/%@.[(";

const OPERATOR_CHARS: &[u8] = b"+-*/%@&|^~\\.";

impl ContextualHandler for BinarySubtraction {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let (Some(left), Some(right)) = (site.group(1), site.group(2)) else {
            return Ok(None);
        };
        if left != right || LOOSER_KEYWORDS.contains(&left) {
            return Ok(None);
        }
        if !opens_expression(&cx.text[..site.start]) {
            return Ok(None);
        }

        let open = opening_bracket(cx.text, site.end, b'[')?;
        let Some(close) = matching_close(cx.text, open) else {
            return Ok(None);
        };
        let key = &cx.text[open + 1..close];
        let trimmed = key.trim();
        // A list or slice selects a frame, not a column.
        if trimmed.is_empty() || trimmed.starts_with('[') || split_top_level(trimmed, b':').len() > 1
        {
            return Ok(None);
        }

        let after = cx.text[close + 1..].trim_start_matches([' ', '\t']);
        if after.bytes().next().is_some_and(|b| TIGHTER_FOLLOWERS.contains(&b)) {
            return Ok(None);
        }

        Ok(Some(SiteEdit::new(
            site.start,
            close + 1,
            format!("{left}.sub({left}[{key}], axis=0)"),
        )))
    }
}

fn opens_expression(before: &str) -> bool {
    let same_line = before.trim_end_matches([' ', '\t']);
    let trimmed = before.trim_end();
    let Some(&last) = trimmed.as_bytes().last() else {
        return true;
    };
    if OPEN_CONTEXT.contains(&last) {
        return true;
    }
    if LOOSER_KEYWORDS.iter().any(|keyword| ends_with_word(trimmed, keyword)) {
        return true;
    }
    // Statement start on a fresh line, unless the previous line dangles an operator.
    same_line.ends_with('\n') && !OPERATOR_CHARS.contains(&last) && !trimmed.ends_with(',')
}

fn ends_with_word(text: &str, word: &str) -> bool {
    text.strip_suffix(word).is_some_and(|head| {
        head.as_bytes()
            .last()
            .is_none_or(|b| !(b.is_ascii_alphanumeric() || *b == b'_' || *b == b'.'))
    })
}
