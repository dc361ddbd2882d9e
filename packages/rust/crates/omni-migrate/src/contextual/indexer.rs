//! `.ix[...]` disambiguation into `.loc[...]` or `.iloc[...]`.
//!
//! The index text is kept verbatim; only the accessor changes. An integer
//! literal used as a *label* is indistinguishable from a position here and is
//! routed to `.iloc`, a documented false positive of the heuristic.

use super::args::{
    is_int_literal, matching_close, opening_bracket, split_top_level, strip_comments,
};
use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::error::TransformError;
use crate::matcher::MatchSite;

pub(crate) struct AmbiguousIndexer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Position,
    Label,
}

impl Access {
    fn accessor(self) -> &'static str {
        match self {
            Self::Position => "iloc",
            Self::Label => "loc",
        }
    }

    fn fragment(self) -> (&'static str, &'static str) {
        match self {
            Self::Position => ("ix_to_iloc", ".ix[] -> .iloc[] (integer position)"),
            Self::Label => ("ix_to_loc", ".ix[] -> .loc[] (label)"),
        }
    }
}

impl ContextualHandler for AmbiguousIndexer {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let open = opening_bracket(cx.text, site.end, b'[')?;
        let close = matching_close(cx.text, open)
            .ok_or_else(|| TransformError::new("unterminated .ix[ indexer"))?;
        let index = &cx.text[open + 1..close];
        let access = classify_index(index);
        let (name, description) = access.fragment();
        Ok(Some(
            SiteEdit::new(
                site.start,
                close + 1,
                format!(".{}[{index}]", access.accessor()),
            )
            .fragment(name, description),
        ))
    }
}

pub(crate) fn classify_index(index: &str) -> Access {
    let cleaned = strip_comments(index);
    let mut parts: Vec<&str> = split_top_level(&cleaned, b',')
        .into_iter()
        .map(str::trim)
        .collect();
    if parts.len() > 1 && parts.last().is_some_and(|last| last.is_empty()) {
        parts.pop();
    }
    let positional = match parts.as_slice() {
        [single] => is_integer_like(single),
        [row, column] => is_integer_like(row) && is_integer_like(column),
        _ => false,
    };
    if positional {
        Access::Position
    } else {
        Access::Label
    }
}

fn is_integer_like(part: &str) -> bool {
    if part.is_empty() {
        return false;
    }
    if is_int_literal(part) {
        return !part.starts_with('-');
    }
    let bounds = split_top_level(part, b':');
    (2..=3).contains(&bounds.len())
        && bounds.iter().map(|bound| bound.trim()).all(|bound| bound.is_empty() || is_int_literal(bound))
}
