//! `.get_value()` / `.set_value()` to the `.at[]` / `.iat[]` accessors.
//!
//! The setter becomes an assignment, which is only legal where the call is a
//! whole statement. Statement boundaries come from the tree-sitter statement
//! index; for files that do not parse cleanly the handler falls back to a
//! two-stage rewrite: each site is first replaced by an inert marker carrying
//! its operands, and [`ContextualHandler::finish`] turns markers into
//! assignments once the rule has settled.

use std::sync::LazyLock;

use regex::Regex;

use super::args::{
    Argument, CallArguments, is_name_chain, matching_close, opening_bracket, parse_arguments,
};
use super::{ContextualHandler, SiteContext, SiteEdit, SiteResult};
use crate::error::TransformError;
use crate::matcher::{MatchSite, compile_regex};

pub(crate) struct GetValue;
pub(crate) struct SetValue;

const MARKER: &str = "__omni_set_value__";
const FIELD: char = '\u{1f}';
const END: char = '\u{1e}';

static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(
        r"__omni_set_value__\x1f([^\x1f\x1e]*)\x1f([^\x1f\x1e]*)\x1f([^\x1f\x1e]*)\x1f([^\x1f\x1e]*)\x1e",
    )
});

fn accessor(arguments: &CallArguments) -> Result<&'static str, TransformError> {
    match arguments.keyword("takeable") {
        None | Some("False") => Ok("at"),
        Some("True") => Ok("iat"),
        Some(other) => Err(TransformError::new(format!(
            "takeable={other} is not a literal; choose .at or .iat manually"
        ))),
    }
}

/// `row, col` for frames, `label` for series.
fn key(arguments: &CallArguments, positional: &[String]) -> Result<String, TransformError> {
    let row = positional
        .first()
        .map(String::as_str)
        .or_else(|| arguments.keyword("index"));
    let column = positional
        .get(1)
        .map(String::as_str)
        .or_else(|| arguments.keyword("col"));
    match (row, column) {
        (Some(row), Some(column)) => Ok(format!("{row}, {column}")),
        (Some(label), None) => Ok(label.to_string()),
        _ => Err(TransformError::new("cannot locate the row/column arguments")),
    }
}

impl ContextualHandler for GetValue {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let open = opening_bracket(cx.text, site.end, b'(')?;
        let close = matching_close(cx.text, open)
            .ok_or_else(|| TransformError::new("unterminated .get_value( call"))?;
        let arguments =
            CallArguments::from_arguments(parse_arguments(&cx.text[open + 1..close]));
        if arguments.has_splat {
            return Err(TransformError::new("star-arguments in .get_value()"));
        }
        if arguments.positional.len() > 2 {
            return Err(TransformError::new("too many arguments to .get_value()"));
        }
        let accessor = accessor(&arguments)?;
        let key = key(&arguments, &arguments.positional)?;
        Ok(Some(
            SiteEdit::new(site.start, close + 1, format!(".{accessor}[{key}]"))
                .fragment("get_value_to_at", format!(".get_value() -> .{accessor}[]")),
        ))
    }
}

/// Accessor, key and value of a setter call.
fn setter_operands(
    arguments: impl IntoIterator<Item = Argument>,
) -> Result<(&'static str, String, String), TransformError> {
    let mut arguments = CallArguments::from_arguments(arguments);
    if arguments.has_splat {
        return Err(TransformError::new("star-arguments in .set_value()"));
    }
    let value = match arguments.keyword("value") {
        Some(value) => value.to_string(),
        None => arguments
            .positional
            .pop()
            .ok_or_else(|| TransformError::new(".set_value() without a value"))?,
    };
    if arguments.positional.len() > 2 {
        return Err(TransformError::new("too many arguments to .set_value()"));
    }
    let accessor = accessor(&arguments)?;
    let key = key(&arguments, &arguments.positional)?;
    Ok((accessor, key, value))
}

impl ContextualHandler for SetValue {
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult {
        let Some(statements) = cx.set_value_statements() else {
            return marker_edit(cx.text, site);
        };
        let Some(statement) = statements
            .iter()
            .find(|call| (site.start..site.end).contains(&call.method_start))
        else {
            return Err(TransformError::new(
                ".set_value() result is used as an expression; rewrite it by hand",
            ));
        };

        let (accessor, key, value) =
            setter_operands(statement.arguments.iter().map(Argument::from))?;
        Ok(Some(
            SiteEdit::new(
                statement.start,
                statement.end,
                format!("{}.{accessor}[{key}] = {value}", statement.receiver),
            )
            .fragment("set_value_to_at", format!(".set_value() -> .{accessor}[] assignment")),
        ))
    }

    fn finish(&self, text: String) -> String {
        if !text.contains(MARKER) {
            return text;
        }
        MARKER_REGEX
            .replace_all(&text, "${1}.${2}[${3}] = ${4}")
            .into_owned()
    }
}

/// Stage one of the fallback: statement-shaped sites become markers.
fn marker_edit(text: &str, site: &MatchSite<'_, '_>) -> SiteResult {
    let line_start = text[..site.start].rfind('\n').map_or(0, |index| index + 1);
    let prefix = &text[line_start..site.start];
    let receiver = prefix.trim_start();
    if !is_name_chain(receiver) {
        return Err(TransformError::new(
            ".set_value() is not a plain statement; rewrite it by hand",
        ));
    }

    let open = opening_bracket(text, site.end, b'(')?;
    let close = matching_close(text, open)
        .ok_or_else(|| TransformError::new("unterminated .set_value( call"))?;
    let rest = text[close + 1..].split('\n').next().unwrap_or_default().trim();
    if !(rest.is_empty() || rest.starts_with('#') || rest.starts_with(';')) {
        return Err(TransformError::new(
            ".set_value() result is used as an expression; rewrite it by hand",
        ));
    }

    let (accessor, key, value) = setter_operands(parse_arguments(&text[open + 1..close]))?;
    let flattened = |part: &str| part.replace('\n', " ");
    let marker = format!(
        "{MARKER}{FIELD}{receiver}{FIELD}{accessor}{FIELD}{}{FIELD}{}{END}",
        flattened(&key),
        flattened(&value)
    );
    let start = site.start - receiver.len();
    Ok(Some(
        SiteEdit::new(start, close + 1, marker)
            .fragment("set_value_to_at", format!(".set_value() -> .{accessor}[] assignment")),
    ))
}
