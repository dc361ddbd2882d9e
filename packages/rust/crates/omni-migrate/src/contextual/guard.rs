//! Guard `X.stack()` against empty input, which raises on current pandas.

use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::matcher::MatchSite;

pub(crate) struct EmptyCollectionGuard;

impl ContextualHandler for EmptyCollectionGuard {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let Some(receiver) = site.group(1) else {
            return Ok(None);
        };
        // `f().x.stack()`: the receiver is not a plain chain.
        if cx.text[..site.start].ends_with('.') {
            return Ok(None);
        }
        if already_guarded(&cx.text[site.end..], receiver) {
            return Ok(None);
        }
        let fallback = cx.config.empty_fallback.as_str();
        Ok(Some(SiteEdit::new(
            site.start,
            site.end,
            format!("({receiver}.stack() if not {receiver}.empty else {fallback})"),
        )))
    }
}

fn already_guarded(after: &str, receiver: &str) -> bool {
    let Some(rest) = after.trim_start().strip_prefix("if") else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix("not") else {
        return false;
    };
    rest.trim_start()
        .strip_prefix(receiver)
        .is_some_and(|rest| rest.starts_with(".empty"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_guarded() {
        assert!(already_guarded(
            " if not df.empty else pd.Series(dtype=object))",
            "df"
        ));
        assert!(!already_guarded(" if not other.empty else x", "df"));
        assert!(!already_guarded(".reset_index()", "df"));
    }
}
