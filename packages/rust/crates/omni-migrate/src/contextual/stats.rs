//! `pd.ols(...)` / `pd.stats.ols.OLS(...)` routing.
//!
//! Three routes, decided from the arguments:
//! - explicit `pool=`: the in-house `OLS` accepts the call as written;
//! - multi-column dependent variable: in-house `OLS` with `pool=True` added;
//! - otherwise: `statsmodels` with an explicit constant.

use super::args::{
    Argument, CallArguments, is_name_chain, matching_close, opening_bracket, parse_arguments,
};
use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::error::TransformError;
use crate::matcher::MatchSite;
use crate::rule::ImportRequirement;

pub(crate) struct StatisticalCall;

const FRAME_HINTS: &[&str] = &["df", "frame", "panel"];

impl ContextualHandler for StatisticalCall {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let open = opening_bracket(cx.text, site.end, b'(')?;
        let close = matching_close(cx.text, open)
            .ok_or_else(|| TransformError::new("unterminated ols call"))?;
        let arguments = parse_arguments(&cx.text[open + 1..close]);
        let rendered: Vec<String> = arguments.iter().map(Argument::render).collect();
        let call = CallArguments::from_arguments(arguments);
        if call.has_splat {
            return Err(TransformError::new("star-arguments in ols call"));
        }

        let in_house = ImportRequirement::new(format!("from {} import OLS", cx.config.ols_module));
        let rename = ("ols_to_inhouse_ols", "pd.ols() -> in-house OLS()");

        if call.keyword("pool").is_some() {
            return Ok(Some(
                SiteEdit::new(site.start, close + 1, format!("OLS({})", rendered.join(", ")))
                    .fragment(rename.0, rename.1)
                    .requiring(in_house),
            ));
        }

        let y = call
            .keyword("y")
            .or_else(|| call.positional.first().map(String::as_str))
            .ok_or_else(|| TransformError::new("cannot locate the dependent variable"))?;

        if is_multi_column(y) {
            let mut pooled = rendered;
            pooled.push("pool=True".to_string());
            return Ok(Some(
                SiteEdit::new(site.start, close + 1, format!("OLS({})", pooled.join(", ")))
                    .fragment(rename.0, rename.1)
                    .fragment(
                        "ols_pool_injection",
                        "pool=True added for multi-column dependent variable",
                    )
                    .requiring(in_house),
            ));
        }

        let x = call
            .keyword("x")
            .or_else(|| call.positional.get(1).map(String::as_str))
            .ok_or_else(|| TransformError::new("cannot locate the regressors"))?;
        if call.positional.len() > 2 {
            return Err(TransformError::new("too many positional arguments to ols"));
        }
        if let Some((name, _)) = call
            .keywords
            .iter()
            .find(|(name, _)| !matches!(name.as_str(), "y" | "x" | "intercept"))
        {
            return Err(TransformError::new(format!(
                "`{name}=` has no statsmodels equivalent"
            )));
        }
        let exog = match call.keyword("intercept") {
            None | Some("True") => format!("sm.add_constant({x})"),
            Some("False") => x.to_string(),
            Some(other) => {
                return Err(TransformError::new(format!(
                    "intercept={other} is not a literal"
                )));
            }
        };

        Ok(Some(
            SiteEdit::new(
                site.start,
                close + 1,
                format!("sm.OLS({y}, {exog}).fit()"),
            )
            .fragment("ols_to_statsmodels", "pd.ols() -> statsmodels OLS")
            .requiring(ImportRequirement::new("import statsmodels.api as sm")),
        ))
    }
}

/// Whether `expr` looks like a DataFrame rather than a single column.
pub(crate) fn is_multi_column(expr: &str) -> bool {
    let expr = expr.trim();
    if expr.contains("[[") {
        return true;
    }
    if ["pd.DataFrame(", "pandas.DataFrame(", "DataFrame("]
        .iter()
        .any(|constructor| expr.starts_with(constructor))
    {
        return true;
    }
    if !is_name_chain(expr) {
        return false;
    }
    let last = expr.rsplit('.').next().unwrap_or(expr).to_ascii_lowercase();
    FRAME_HINTS.iter().any(|hint| last.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_column_heuristic() {
        assert!(is_multi_column("returns_df"));
        assert!(is_multi_column("self.frame"));
        assert!(is_multi_column("df[['a', 'b']]"));
        assert!(is_multi_column("pd.DataFrame(data)"));
        assert!(!is_multi_column("df['A']"));
        assert!(!is_multi_column("returns"));
        assert!(!is_multi_column("y"));
    }
}
