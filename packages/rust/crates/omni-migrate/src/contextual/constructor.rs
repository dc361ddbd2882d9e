//! Range-form `pd.DatetimeIndex(...)` to `pd.date_range(...)`.

use super::args::{Argument, CallArguments, matching_close, opening_bracket, parse_arguments};
use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::error::TransformError;
use crate::matcher::MatchSite;

pub(crate) struct DatetimeIndexConstructor;

const RANGE_KEYWORDS: &[&str] = &["start", "end", "periods"];

const DATE_RANGE_KEYWORDS: &[&str] = &[
    "start", "end", "periods", "freq", "tz", "normalize", "name", "closed",
];

impl ContextualHandler for DatetimeIndexConstructor {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let Some(namespace) = site.group(1) else {
            return Ok(None);
        };
        let open = opening_bracket(cx.text, site.end, b'(')?;
        let Some(close) = matching_close(cx.text, open) else {
            return Ok(None);
        };
        let arguments = parse_arguments(&cx.text[open + 1..close]);
        let rendered: Vec<String> = arguments.iter().map(Argument::render).collect();
        let call = CallArguments::from_arguments(arguments);
        if call.has_splat {
            return Ok(None);
        }

        let keyword_range = call.positional.is_empty()
            && call
                .keywords
                .iter()
                .any(|(name, _)| RANGE_KEYWORDS.contains(&name.as_str()));
        let positional_range = call.positional.len() == 2 && call.keyword("freq").is_some();
        if !(keyword_range || positional_range) {
            return Ok(None);
        }

        if let Some((name, _)) = call
            .keywords
            .iter()
            .find(|(name, _)| !DATE_RANGE_KEYWORDS.contains(&name.as_str()))
        {
            return Err(TransformError::new(format!(
                "`{name}=` has no pd.date_range equivalent"
            )));
        }

        Ok(Some(
            SiteEdit::new(
                site.start,
                close + 1,
                format!("{namespace}.date_range({})", rendered.join(", ")),
            )
            .fragment(
                "datetimeindex_to_date_range",
                "pd.DatetimeIndex(start, end, freq) -> pd.date_range()",
            ),
        ))
    }
}
