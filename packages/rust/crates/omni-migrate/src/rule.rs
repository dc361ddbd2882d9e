//! Rule model: what to detect, what to write instead, and what it costs.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::MigrateError;
use crate::types::Risk;

/// An import statement a rewrite depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRequirement {
    /// Full statement, e.g. `import statsmodels.api as sm`
    pub statement: String,
    /// Substring whose presence means the requirement is already met
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl ImportRequirement {
    /// Requirement satisfied only by an equivalent import.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            marker: None,
        }
    }

    /// Also treat any occurrence of `marker` in the text as satisfying it.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }
}

/// Built-in contextual handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// `.ix[...]` → `.loc[...]` / `.iloc[...]`
    AmbiguousIndexer,
    /// `pd.rolling_*` / `pd.expanding_*` / `pd.ewm*` → method chains
    WindowedAggregation,
    /// `.get_value(r, c)` → `.at[r, c]`
    GetValue,
    /// `x.set_value(r, c, v)` → `x.at[r, c] = v`
    SetValue,
    /// `x.stack()` → guarded conditional expression
    EmptyCollectionGuard,
    /// `a - a[k]` → `a.sub(a[k], axis=0)`
    BinarySubtraction,
    /// `pd.ols(...)` → in-house `OLS` or statsmodels
    StatisticalCall,
    /// `pd.DatetimeIndex(start, end, freq=...)` → `pd.date_range(...)`
    DatetimeIndexConstructor,
}

/// How a match is rewritten.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Regex replacement template (`${1}` refers to capture groups).
    Template(String),
    /// Contextual handler.
    Handler(HandlerKind),
}

/// An immutable rewrite rule.
///
/// Built with the consuming `with_*` methods, then frozen inside a
/// [`crate::RuleCatalog`].
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: String,
    detect: Regex,
    replacement: Replacement,
    priority: Option<i32>,
    risk: Risk,
    description: String,
    requires_import: Vec<ImportRequirement>,
    tracked: bool,
}

impl RewriteRule {
    fn compile(
        name: impl Into<String>,
        detect: &str,
        replacement: Replacement,
    ) -> Result<Self, MigrateError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MigrateError::InvalidRule {
                rule: name,
                reason: "rule name is empty".to_string(),
            });
        }
        if detect.is_empty() {
            return Err(MigrateError::InvalidRule {
                rule: name,
                reason: "detection pattern is empty".to_string(),
            });
        }
        let detect = Regex::new(detect).map_err(|source| MigrateError::Detection {
            rule: name.clone(),
            source,
        })?;
        Ok(Self {
            description: name.clone(),
            name,
            detect,
            replacement,
            priority: None,
            risk: Risk::Low,
            requires_import: Vec::new(),
            tracked: true,
        })
    }

    /// Rule rewritten by regex template substitution.
    ///
    /// # Errors
    ///
    /// [`MigrateError::Detection`] when `detect` does not compile,
    /// [`MigrateError::InvalidRule`] when name or pattern is empty.
    pub fn template(
        name: impl Into<String>,
        detect: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, MigrateError> {
        Self::compile(name, detect, Replacement::Template(replacement.into()))
    }

    /// Rule rewritten by a contextual handler.
    ///
    /// Handlers read the call or subscript that follows the match, so the
    /// pattern must consume at least one character.
    ///
    /// # Errors
    ///
    /// Same as [`RewriteRule::template`], plus [`MigrateError::InvalidRule`]
    /// when `detect` matches empty text.
    pub fn handler(
        name: impl Into<String>,
        detect: &str,
        kind: HandlerKind,
    ) -> Result<Self, MigrateError> {
        let rule = Self::compile(name, detect, Replacement::Handler(kind))?;
        if rule.detect.is_match("") {
            return Err(MigrateError::InvalidRule {
                rule: rule.name,
                reason: "handler pattern matches empty text".to_string(),
            });
        }
        Ok(rule)
    }

    /// Compile a serialized rule.
    ///
    /// # Errors
    ///
    /// Same as [`RewriteRule::template`].
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, MigrateError> {
        let mut rule = Self::template(&spec.name, &spec.detect, &spec.replace)?
            .with_risk(spec.risk)
            .with_description(spec.description.as_deref().unwrap_or(&spec.name));
        rule.priority = spec.priority;
        rule.requires_import.clone_from(&spec.requires_import);
        rule.tracked = spec.tracked;
        Ok(rule)
    }

    /// Set the priority (lower applies first).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the risk level.
    #[must_use]
    pub fn with_risk(mut self, risk: Risk) -> Self {
        self.risk = risk;
        self
    }

    /// Set the human description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an import the rewritten code depends on.
    #[must_use]
    pub fn requiring(mut self, requirement: ImportRequirement) -> Self {
        self.requires_import.push(requirement);
        self
    }

    /// Exclude the pattern from classification (behaviour guards, not deprecated APIs).
    #[must_use]
    pub fn untracked(mut self) -> Self {
        self.tracked = false;
        self
    }

    pub(crate) fn resolve_priority(&mut self, fallback: i32) {
        self.priority.get_or_insert(fallback);
    }

    /// Unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Detection pattern.
    #[must_use]
    pub fn detect(&self) -> &Regex {
        &self.detect
    }

    /// Replacement strategy.
    #[must_use]
    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    /// Priority; rules not yet placed in a catalog sort last.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority.unwrap_or(i32::MAX)
    }

    /// Whether a priority was given explicitly or assigned by a catalog.
    #[must_use]
    pub fn has_priority(&self) -> bool {
        self.priority.is_some()
    }

    /// Risk level.
    #[must_use]
    pub fn risk(&self) -> Risk {
        self.risk
    }

    /// Human description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Imports the rewrite depends on, in declaration order.
    #[must_use]
    pub fn requires_import(&self) -> &[ImportRequirement] {
        &self.requires_import
    }

    /// Whether the classifier treats a match as a deprecated API use.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    /// Whether the rule runs in the contextual pass.
    #[must_use]
    pub fn is_contextual(&self) -> bool {
        matches!(self.replacement, Replacement::Handler(_))
    }
}

/// Serialized form of a template rule, e.g. from a JSON config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Unique rule name
    pub name: String,
    /// Regex detection pattern
    pub detect: String,
    /// Regex replacement template
    pub replace: String,
    /// Human description (defaults to the name)
    #[serde(default)]
    pub description: Option<String>,
    /// Explicit priority; omitted means "after every existing rule"
    #[serde(default)]
    pub priority: Option<i32>,
    /// Risk level (default low)
    #[serde(default)]
    pub risk: Risk,
    /// Imports the rewrite depends on
    #[serde(default)]
    pub requires_import: Vec<ImportRequirement>,
    /// Whether matches count as deprecated API use (default true)
    #[serde(default = "default_tracked")]
    pub tracked: bool,
}

fn default_tracked() -> bool {
    true
}

impl RuleSpec {
    /// Minimal spec with default risk, priority and tracking.
    pub fn new(
        name: impl Into<String>,
        detect: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            detect: detect.into(),
            replace: replace.into(),
            description: None,
            priority: None,
            risk: Risk::Low,
            requires_import: Vec::new(),
            tracked: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_is_detection_error() {
        let err = RewriteRule::template("broken", "(unclosed", "x").expect_err("must fail");
        match err {
            MigrateError::Detection { rule, .. } => assert_eq!(rule, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let err = RewriteRule::template("  ", "x", "y").expect_err("must fail");
        assert!(matches!(err, MigrateError::InvalidRule { .. }));
    }

    #[test]
    fn test_handler_pattern_matching_empty_text_is_invalid() {
        for pattern in [r"(?m)^", "$", r"(?:\.ix)?", r"\s*"] {
            let err = RewriteRule::handler("h", pattern, HandlerKind::GetValue)
                .expect_err("must fail");
            assert!(
                matches!(&err, MigrateError::InvalidRule { rule, .. } if rule == "h"),
                "{pattern}: {err}"
            );
        }
        assert!(RewriteRule::handler("h", r"\.get_value\s*\(", HandlerKind::GetValue).is_ok());
    }

    #[test]
    fn test_spec_defaults_from_json() {
        let spec: RuleSpec =
            serde_json::from_str(r#"{"name": "n", "detect": "a", "replace": "b"}"#)
                .expect("spec");
        assert!(spec.tracked);
        assert_eq!(spec.risk, Risk::Low);
        let rule = RewriteRule::from_spec(&spec).expect("compile");
        assert_eq!(rule.description(), "n");
        assert!(!rule.has_priority());
        assert!(!rule.is_contextual());
    }
}
