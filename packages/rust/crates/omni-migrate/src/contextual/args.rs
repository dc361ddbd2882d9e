//! Bracket- and string-aware scanning of Python source fragments.
//!
//! Delimiters are ASCII, so scanning bytes is safe on UTF-8 text: a
//! multi-byte sequence never contains a byte that equals `(`, `'`, `#`, ...

use std::borrow::Cow;

use crate::error::TransformError;

/// One call argument as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Argument {
    Positional(String),
    Keyword(String, String),
    /// `*args` / `**kwargs`, stars included
    Splat(String),
}

impl Argument {
    fn parse(piece: &str) -> Self {
        if piece.starts_with('*') {
            return Self::Splat(piece.to_string());
        }
        let name_len = piece
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if name_len > 0 && !piece.as_bytes()[0].is_ascii_digit() {
            let rest = piece[name_len..].trim_start();
            if let Some(value) = rest.strip_prefix('=') {
                if !value.starts_with('=') {
                    return Self::Keyword(piece[..name_len].to_string(), value.trim().to_string());
                }
            }
        }
        Self::Positional(piece.to_string())
    }

    pub(crate) fn render(&self) -> String {
        match self {
            Self::Positional(value) | Self::Splat(value) => value.clone(),
            Self::Keyword(name, value) => format!("{name}={value}"),
        }
    }
}

impl From<&omni_ast::CallArgument> for Argument {
    fn from(argument: &omni_ast::CallArgument) -> Self {
        match argument {
            omni_ast::CallArgument::Positional { value } => Self::Positional(value.clone()),
            omni_ast::CallArgument::Keyword { name, value } => {
                Self::Keyword(name.clone(), value.clone())
            }
            omni_ast::CallArgument::Splat { value } => Self::Splat(value.clone()),
        }
    }
}

/// Arguments split into positional and keyword lists.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallArguments {
    pub positional: Vec<String>,
    pub keywords: Vec<(String, String)>,
    pub has_splat: bool,
}

impl CallArguments {
    pub(crate) fn from_arguments(arguments: impl IntoIterator<Item = Argument>) -> Self {
        let mut out = Self::default();
        for argument in arguments {
            match argument {
                Argument::Positional(value) => out.positional.push(value),
                Argument::Keyword(name, value) => out.keywords.push((name, value)),
                Argument::Splat(_) => out.has_splat = true,
            }
        }
        out
    }

    pub(crate) fn keyword(&self, name: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse the text between a call's parentheses.
pub(crate) fn parse_arguments(inner: &str) -> Vec<Argument> {
    let cleaned = strip_comments(inner);
    split_top_level(&cleaned, b',')
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(Argument::parse)
        .collect()
}

/// Offset of the `bracket` a call or subscript match must end on.
///
/// Custom handler rules may match anything, so the byte is checked rather
/// than assumed.
pub(crate) fn opening_bracket(
    text: &str,
    site_end: usize,
    bracket: u8,
) -> Result<usize, TransformError> {
    site_end
        .checked_sub(1)
        .filter(|&open| text.as_bytes().get(open) == Some(&bracket))
        .ok_or_else(|| {
            TransformError::new(format!(
                "match does not end on `{}`; the handler cannot locate its arguments",
                char::from(bracket)
            ))
        })
}

/// Index of the bracket closing the one at `open`.
///
/// Skips string literals and comments. `None` when unbalanced.
pub(crate) fn matching_close(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => stack.push(b')'),
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            close @ (b')' | b']' | b'}') => {
                if stack.pop() != Some(close) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            b'\'' | b'"' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'#' => {
                i = skip_comment(bytes, i);
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index just past the string literal starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let triple = bytes.get(start + 1) == Some(&quote) && bytes.get(start + 2) == Some(&quote);
    let mut i = if triple { start + 3 } else { start + 1 };
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => {
                if !triple {
                    return Some(i + 1);
                }
                if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                    return Some(i + 3);
                }
                i += 1;
            }
            b'\n' if !triple => return None,
            _ => i += 1,
        }
    }
    None
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    memchr::memchr(b'\n', &bytes[start..]).map_or(bytes.len(), |offset| start + offset)
}

/// Split `text` on `separator` where it is not nested in brackets or strings.
///
/// Pieces are returned untrimmed; empty pieces are kept.
pub(crate) fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut piece_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'\'' | b'"' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'#' => {
                i = skip_comment(bytes, i);
                continue;
            }
            c if c == separator && depth == 0 => {
                pieces.push(&text[piece_start..i]);
                piece_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    pieces.push(&text[piece_start..]);
    pieces
}

/// Remove `#` comments outside string literals.
pub(crate) fn strip_comments(text: &str) -> Cow<'_, str> {
    if !text.contains('#') {
        return Cow::Borrowed(text);
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = skip_string(bytes, i).unwrap_or(bytes.len()),
            b'#' => {
                out.push_str(&text[copied..i]);
                i = skip_comment(bytes, i);
                copied = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&text[copied..]);
    Cow::Owned(out)
}

/// Whether `expr` can take a method call without parentheses.
///
/// True for names, attribute chains, calls, subscripts and literals; false as
/// soon as a top-level operator or space appears.
pub(crate) fn is_primary(expr: &str) -> bool {
    let bytes = expr.as_bytes();
    if bytes.is_empty() || bytes[0].is_ascii_digit() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => match matching_close(expr, i) {
                Some(close) => i = close + 1,
                None => return false,
            },
            b'\'' | b'"' => match skip_string(bytes, i) {
                Some(end) => i = end,
                None => return false,
            },
            c if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => i += 1,
            _ => return false,
        }
    }
    !matches!(expr, "not" | "lambda" | "await" | "yield")
}

/// `expr`, parenthesised unless it is already primary.
pub(crate) fn as_receiver(expr: &str) -> Cow<'_, str> {
    if is_primary(expr) {
        Cow::Borrowed(expr)
    } else {
        Cow::Owned(format!("({expr})"))
    }
}

/// Whether `expr` is a plain name or dotted attribute chain.
pub(crate) fn is_name_chain(expr: &str) -> bool {
    !expr.is_empty()
        && expr.split('.').all(|part| {
            part.bytes()
                .next()
                .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
                && part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        })
}

/// Whether `text` is a (possibly negative) integer literal.
pub(crate) fn is_int_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text).trim_start();
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit() || b == b'_')
        && digits.as_bytes()[0].is_ascii_digit()
}
