//! Match-site enumeration for a single rule.

use memchr::memchr_iter;
use regex::{CaptureMatches, Captures, Regex};

use crate::rule::RewriteRule;

/// Compile a hardcoded pattern; a broken pattern degrades to one that never matches.
pub(crate) fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

/// One place where a rule's pattern matched.
///
/// Borrowed from the text it was found in; offsets are meaningless once that
/// text changes.
#[derive(Debug)]
pub struct MatchSite<'r, 't> {
    /// Rule that matched
    pub rule_name: &'r str,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset of the match end (exclusive)
    pub end: usize,
    /// Matched text
    pub text: &'t str,
    /// 1-based line of the match start
    pub line: usize,
    captures: Captures<'t>,
}

impl<'t> MatchSite<'_, 't> {
    /// Text of capture group `index`, if it participated.
    #[must_use]
    pub fn group(&self, index: usize) -> Option<&'t str> {
        self.captures.get(index).map(|m| m.as_str())
    }

    /// Text of the named capture group, if it participated.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&'t str> {
        self.captures.name(name).map(|m| m.as_str())
    }
}

/// Enumerates the match sites of one rule.
pub struct PatternMatcher<'r> {
    rule: &'r RewriteRule,
}

impl<'r> PatternMatcher<'r> {
    /// Matcher for `rule`.
    #[must_use]
    pub fn new(rule: &'r RewriteRule) -> Self {
        Self { rule }
    }

    /// Lazily iterate over non-overlapping, leftmost-first match sites.
    ///
    /// Calling this again restarts the scan from the beginning of `text`.
    pub fn sites<'t>(&self, text: &'t str) -> MatchSites<'r, 't> {
        MatchSites {
            rule_name: self.rule.name(),
            haystack: text,
            inner: self.rule.detect().captures_iter(text),
            line: 1,
            cursor: 0,
        }
    }
}

/// Iterator returned by [`PatternMatcher::sites`].
pub struct MatchSites<'r, 't> {
    rule_name: &'r str,
    haystack: &'t str,
    inner: CaptureMatches<'r, 't>,
    line: usize,
    cursor: usize,
}

impl<'r, 't> Iterator for MatchSites<'r, 't> {
    type Item = MatchSite<'r, 't>;

    fn next(&mut self) -> Option<Self::Item> {
        let captures = self.inner.next()?;
        let whole = captures.get(0)?;
        let (start, end, text) = (whole.start(), whole.end(), whole.as_str());

        self.line += memchr_iter(b'\n', &self.haystack.as_bytes()[self.cursor..start]).count();
        self.cursor = start;

        Some(MatchSite {
            rule_name: self.rule_name,
            start,
            end,
            text,
            line: self.line,
            captures,
        })
    }
}

/// 1-based line of byte `offset` in `text`.
pub(crate) fn line_at(text: &str, offset: usize) -> usize {
    let offset = offset.min(text.len());
    memchr_iter(b'\n', &text.as_bytes()[..offset]).count() + 1
}
