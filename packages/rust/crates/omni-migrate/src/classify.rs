//! Compatibility classification: does this file need rewriting at all?

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexSet};

use crate::allow::AllowList;
use crate::catalog::RuleCatalog;
use crate::error::MigrateError;
use crate::matcher::compile_regex;
use crate::types::{Compatibility, FileClassification};

static PANDAS_SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"\bpandas\b|\bpd\."));

/// Classifies files against the tracked rules of a catalog in a single scan.
#[derive(Debug, Clone)]
pub struct CompatibilityClassifier {
    signatures: RegexSet,
    names: Vec<String>,
    allow_list: AllowList,
}

impl CompatibilityClassifier {
    /// Build the signature set from `catalog`'s tracked rules.
    ///
    /// # Errors
    ///
    /// [`MigrateError::Detection`] when the combined set exceeds regex limits.
    pub fn new(catalog: &RuleCatalog, allow_list: AllowList) -> Result<Self, MigrateError> {
        let tracked: Vec<_> = catalog
            .rules()
            .iter()
            .filter(|rule| rule.is_tracked())
            .collect();
        let signatures = RegexSet::new(tracked.iter().map(|rule| rule.detect().as_str()))
            .map_err(|source| MigrateError::Detection {
                rule: "<signature set>".to_string(),
                source,
            })?;
        let names = tracked.iter().map(|rule| rule.name().to_string()).collect();
        Ok(Self {
            signatures,
            names,
            allow_list,
        })
    }

    /// The allow-list consulted before the signature scan.
    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Classify `text`.
    #[must_use]
    pub fn classify(&self, text: &str) -> FileClassification {
        if !PANDAS_SIGNATURE.is_match(text) {
            return FileClassification {
                state: Compatibility::NotApplicable,
                needs_rewrite: false,
                reason: "no pandas usage detected".to_string(),
                detected_apis: BTreeSet::new(),
                protected: Vec::new(),
            };
        }

        let protected = self.allow_list.matches(text);
        if !protected.is_empty() {
            return FileClassification {
                state: Compatibility::AlreadyCompatible,
                needs_rewrite: false,
                reason: format!("uses allow-listed constructs: {}", protected.join(", ")),
                detected_apis: BTreeSet::new(),
                protected,
            };
        }

        let detected_apis: BTreeSet<String> = self
            .signatures
            .matches(text)
            .into_iter()
            .map(|index| self.names[index].clone())
            .collect();
        if detected_apis.is_empty() {
            return FileClassification {
                state: Compatibility::AlreadyCompatible,
                needs_rewrite: false,
                reason: "no deprecated pandas APIs detected".to_string(),
                detected_apis,
                protected,
            };
        }

        FileClassification {
            state: Compatibility::NeedsRewrite,
            needs_rewrite: true,
            reason: format!("found {} deprecated API pattern(s)", detected_apis.len()),
            detected_apis,
            protected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MigrateConfig;

    fn classifier() -> CompatibilityClassifier {
        let catalog = RuleCatalog::builtin(&MigrateConfig::default()).expect("catalog");
        CompatibilityClassifier::new(&catalog, AllowList::builtin()).expect("classifier")
    }

    #[test]
    fn test_untracked_guard_does_not_flag() {
        let result = classifier().classify("import pandas as pd\ns = df.stack()\n");
        assert_eq!(result.state, Compatibility::AlreadyCompatible);
    }

    #[test]
    fn test_detected_names_are_sorted() {
        let result = classifier().classify("import pandas as pd\ndf.ix[0]\ndf.as_matrix()\n");
        let names: Vec<&str> = result.detected_apis.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["as_matrix_to_values", "ix_indexer"]);
    }
}
