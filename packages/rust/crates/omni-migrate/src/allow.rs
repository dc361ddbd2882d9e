//! Allow-listed constructs: legacy signatures that must survive a rewrite untouched.
//!
//! Protected spans are swapped for inert placeholders before any rule runs
//! and swapped back before imports are injected, so no pattern can ever see
//! (or partially overlap) them. Placeholders keep the newline count of the
//! span they replace, which keeps line numbers in the change log exact.

use regex::Regex;

use crate::error::MigrateError;

/// Whether a signature matches a whole statement or an expression fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Replaced by `import __omni_keep_N__`
    Statement,
    /// Replaced by `__omni_keep_N__`
    Expression,
}

#[derive(Debug, Clone)]
struct AllowSignature {
    name: String,
    pattern: Regex,
    kind: SpanKind,
}

/// Ordered set of allow-listed signatures.
#[derive(Debug, Clone)]
pub struct AllowList {
    signatures: Vec<AllowSignature>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN: &[(&str, &str, SpanKind)] = &[
    (
        "pandas.util.testing import",
        r"\bfrom[ \t]+pandas\.util\.testing[ \t]+import[ \t]+(?:\([^)]*\)|[^\n;#]*)",
        SpanKind::Statement,
    ),
    (
        "pandas.util.testing import",
        r"\bfrom[ \t]+pandas\.util[ \t]+import[ \t]+testing\b(?:[ \t]+as[ \t]+\w+)?",
        SpanKind::Statement,
    ),
    (
        "pandas.util.testing import",
        r"\bimport[ \t]+pandas\.util\.testing\b(?:[ \t]+as[ \t]+\w+)?",
        SpanKind::Statement,
    ),
    (
        "pandas.compat import",
        r"\bfrom[ \t]+pandas\.compat\b[\w.]*[ \t]+import[ \t]+(?:\([^)]*\)|[^\n;#]*)",
        SpanKind::Statement,
    ),
    (
        "pandas.compat import",
        r"\bimport[ \t]+pandas\.compat\b[\w.]*(?:[ \t]+as[ \t]+\w+)?",
        SpanKind::Statement,
    ),
    (
        "pandas.util.testing usage",
        r"\b(?:pd|pandas)\.util\.testing\.[A-Za-z_]\w*",
        SpanKind::Expression,
    ),
];

impl AllowList {
    /// The built-in signatures: `pandas.util.testing` and `pandas.compat`.
    #[must_use]
    pub fn builtin() -> Self {
        let signatures = BUILTIN
            .iter()
            .filter_map(|(name, pattern, kind)| {
                Regex::new(pattern).ok().map(|pattern| AllowSignature {
                    name: (*name).to_string(),
                    pattern,
                    kind: *kind,
                })
            })
            .collect();
        Self { signatures }
    }

    /// An allow-list protecting nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            signatures: Vec::new(),
        }
    }

    /// Add a signature.
    ///
    /// # Errors
    ///
    /// [`MigrateError::Detection`] when `pattern` does not compile.
    pub fn with_signature(
        mut self,
        name: impl Into<String>,
        pattern: &str,
        kind: SpanKind,
    ) -> Result<Self, MigrateError> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|source| MigrateError::Detection {
            rule: name.clone(),
            source,
        })?;
        self.signatures.push(AllowSignature {
            name,
            pattern,
            kind,
        });
        Ok(self)
    }

    /// Names of the signatures present in `text`, deduplicated, in list order.
    #[must_use]
    pub fn matches(&self, text: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for signature in &self.signatures {
            if signature.pattern.is_match(text) && !names.contains(&signature.name) {
                names.push(signature.name.clone());
            }
        }
        names
    }

    /// Replace every protected span with a placeholder.
    #[must_use]
    pub fn protect(&self, text: &str) -> (String, ProtectedSpans) {
        let mut spans: Vec<(usize, usize, SpanKind)> = self
            .signatures
            .iter()
            .flat_map(|signature| {
                signature
                    .pattern
                    .find_iter(text)
                    .filter(|m| !m.as_str().trim().is_empty())
                    .map(move |m| (m.start(), m.end(), signature.kind))
            })
            .collect();
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut kept: Vec<(usize, usize, SpanKind)> = Vec::new();
        for span in spans {
            if kept.last().is_none_or(|last| span.0 >= last.1) {
                kept.push(span);
            }
        }

        let mut out = text.to_string();
        let mut protected = Vec::with_capacity(kept.len());
        for (index, (start, end, kind)) in kept.iter().enumerate() {
            let original = &text[*start..*end];
            let newlines = original.matches('\n').count();
            let token = format!("__omni_keep_{index}__");
            let placeholder = match kind {
                SpanKind::Statement => format!("import {token}{}", "\n".repeat(newlines)),
                SpanKind::Expression => format!("{token}{}", "\n".repeat(newlines)),
            };
            protected.push((placeholder, original.to_string()));
        }
        for ((start, end, _), (placeholder, _)) in kept.iter().zip(&protected).rev() {
            out.replace_range(*start..*end, placeholder);
        }
        (out, ProtectedSpans { spans: protected })
    }
}

/// Placeholder/original pairs produced by [`AllowList::protect`].
#[derive(Debug, Clone, Default)]
pub struct ProtectedSpans {
    spans: Vec<(String, String)>,
}

impl ProtectedSpans {
    /// Put the original spans back.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (placeholder, original) in &self.spans {
            if let Some(position) = out.find(placeholder.as_str()) {
                out.replace_range(position..position + placeholder.len(), original);
            }
        }
        out
    }

    /// Number of protected spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether nothing was protected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
