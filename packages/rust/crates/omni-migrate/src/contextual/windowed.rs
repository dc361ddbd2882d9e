//! `pd.rolling_*`, `pd.expanding_*` and `pd.ewm*` module functions to method chains.
//!
//! `pd.rolling_mean(s, 5, min_periods=2)` becomes `s.rolling(5, min_periods=2).mean()`:
//! window arguments stay on the window call, aggregation arguments move to
//! the aggregation call.

use super::args::{Argument, as_receiver, matching_close, opening_bracket, parse_arguments};
use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::error::TransformError;
use crate::matcher::MatchSite;

pub(crate) struct WindowedAggregation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Rolling,
    Expanding,
    Ewm,
}

impl Family {
    fn method(self) -> &'static str {
        match self {
            Self::Rolling => "rolling",
            Self::Expanding => "expanding",
            Self::Ewm => "ewm",
        }
    }
}

const WINDOWED_AGGREGATIONS: &[&str] = &[
    "mean", "sum", "std", "var", "min", "max", "median", "count", "skew", "kurt", "quantile",
    "apply", "corr", "cov",
];

/// Keywords that belong to the aggregation call rather than the window call.
const AGGREGATION_KEYWORDS: &[&str] = &[
    "ddof", "bias", "quantile", "func", "args", "kwargs", "pairwise",
];

/// Keywords the method API dropped.
const UNSUPPORTED_KEYWORDS: &[&str] = &["freq", "how"];

fn resolve(site: &MatchSite<'_, '_>) -> Result<(Family, &'static str), TransformError> {
    if let Some(ewm) = site.named("ewm") {
        let aggregation = match ewm {
            "a" => "mean",
            "std" | "vol" => "std",
            "var" => "var",
            "corr" => "corr",
            "cov" => "cov",
            other => return Err(TransformError::new(format!("unknown ewm function ewm{other}"))),
        };
        return Ok((Family::Ewm, aggregation));
    }

    let family = match site.named("family") {
        Some("rolling") => Family::Rolling,
        Some("expanding") => Family::Expanding,
        _ => return Err(TransformError::new("unrecognised windowed function")),
    };
    let requested = site.named("agg").unwrap_or_default();
    WINDOWED_AGGREGATIONS
        .iter()
        .find(|known| **known == requested)
        .map(|known| (family, *known))
        .ok_or_else(|| {
            TransformError::new(format!(
                "pd.{}_{requested} has no .{}() equivalent",
                family.method(),
                family.method()
            ))
        })
}

impl ContextualHandler for WindowedAggregation {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let (family, aggregation) = resolve(site)?;
        let open = opening_bracket(cx.text, site.end, b'(')?;
        let close = matching_close(cx.text, open)
            .ok_or_else(|| TransformError::new("unterminated windowed function call"))?;
        let arguments = parse_arguments(&cx.text[open + 1..close]);
        let call = WindowedCall::split(family, aggregation, arguments)?;

        let name = format!("{}_{aggregation}", family.method());
        let description = format!(
            "pd.{name}() -> .{}().{aggregation}()",
            family.method()
        );
        Ok(Some(
            SiteEdit::new(site.start, close + 1, call.render()).fragment(name, description),
        ))
    }
}

fn take_keyword(keywords: &mut Vec<(String, String)>, names: &[&str]) -> Option<String> {
    keywords
        .iter()
        .position(|(name, _)| names.contains(&name.as_str()))
        .map(|index| keywords.remove(index).1)
}

#[derive(Debug, Default)]
struct WindowedCall {
    family_method: &'static str,
    aggregation: &'static str,
    data: String,
    window_args: Vec<String>,
    aggregation_args: Vec<String>,
}

impl WindowedCall {
    fn split(
        family: Family,
        aggregation: &'static str,
        arguments: Vec<Argument>,
    ) -> Result<Self, TransformError> {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        for argument in arguments {
            match argument {
                Argument::Positional(value) => positional.push(value),
                Argument::Keyword(name, value) => keywords.push((name, value)),
                Argument::Splat(_) => {
                    return Err(TransformError::new(
                        "star-arguments cannot be split between window and aggregation",
                    ));
                }
            }
        }

        let mut positional = positional.into_iter();

        let data = positional
            .next()
            .or_else(|| take_keyword(&mut keywords, &["arg", "arg1"]))
            .ok_or_else(|| TransformError::new("missing data argument"))?;

        let mut call = Self {
            family_method: family.method(),
            aggregation,
            data,
            ..Self::default()
        };

        if matches!(aggregation, "corr" | "cov") {
            // Second data argument comes before the window.
            if let Some(other) =
                take_keyword(&mut keywords, &["arg2"]).or_else(|| positional.next())
            {
                call.aggregation_args.push(other);
            }
        }

        if family == Family::Rolling {
            let window = positional
                .next()
                .or_else(|| take_keyword(&mut keywords, &["window"]))
                .ok_or_else(|| TransformError::new("rolling function without a window"))?;
            call.window_args.push(window);
        }

        if matches!(aggregation, "quantile" | "apply") {
            if let Some(bound) = positional.next() {
                call.aggregation_args.push(bound);
            }
        }
        call.window_args.extend(positional);

        for (name, value) in keywords {
            if UNSUPPORTED_KEYWORDS.contains(&name.as_str()) {
                return Err(TransformError::new(format!(
                    "`{name}=` has no equivalent on .{}()",
                    family.method()
                )));
            }
            let rendered = format!("{name}={value}");
            if AGGREGATION_KEYWORDS.contains(&name.as_str()) {
                call.aggregation_args.push(rendered);
            } else {
                call.window_args.push(rendered);
            }
        }
        Ok(call)
    }

    fn render(&self) -> String {
        format!(
            "{}.{}({}).{}({})",
            as_receiver(self.data.trim()),
            self.family_method,
            self.window_args.join(", "),
            self.aggregation,
            self.aggregation_args.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(
        family: Family,
        aggregation: &'static str,
        inner: &str,
    ) -> Result<String, TransformError> {
        WindowedCall::split(family, aggregation, parse_arguments(inner)).map(|call| call.render())
    }

    #[test]
    fn test_window_keyword_becomes_positional() {
        assert_eq!(
            render(Family::Rolling, "mean", "df['A'], window=2").expect("rewrite"),
            "df['A'].rolling(2).mean()"
        );
    }

    #[test]
    fn test_extra_arguments_pass_through() {
        assert_eq!(
            render(Family::Rolling, "sum", "s, 5, 2, center=True").expect("rewrite"),
            "s.rolling(5, 2, center=True).sum()"
        );
    }

    #[test]
    fn test_aggregation_arguments_move() {
        assert_eq!(
            render(Family::Rolling, "std", "s, 10, ddof=0").expect("rewrite"),
            "s.rolling(10).std(ddof=0)"
        );
        assert_eq!(
            render(Family::Rolling, "quantile", "s, 10, 0.5").expect("rewrite"),
            "s.rolling(10).quantile(0.5)"
        );
        assert_eq!(
            render(Family::Rolling, "corr", "a, b, 20").expect("rewrite"),
            "a.rolling(20).corr(b)"
        );
    }

    #[test]
    fn test_complex_data_is_parenthesised() {
        assert_eq!(
            render(Family::Expanding, "max", "a + b, min_periods=3").expect("rewrite"),
            "(a + b).expanding(min_periods=3).max()"
        );
    }

    #[test]
    fn test_ewm() {
        assert_eq!(
            render(Family::Ewm, "mean", "s, span=20").expect("rewrite"),
            "s.ewm(span=20).mean()"
        );
        assert_eq!(
            render(Family::Ewm, "cov", "a, b, com=0.5").expect("rewrite"),
            "a.ewm(com=0.5).cov(b)"
        );
    }

    #[test]
    fn test_unsupported_keyword_is_error() {
        let err = render(Family::Rolling, "mean", "s, 5, freq='D'").expect_err("freq");
        assert!(err.message().contains("freq"));
    }

    #[test]
    fn test_missing_window_is_error() {
        assert!(render(Family::Rolling, "mean", "s").is_err());
    }
}
