//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;
use crate::rule::RuleSpec;

/// Which slice of the canonical catalog to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    /// Pure pandas replacements only.
    Core,
    /// Core plus replacements targeting the in-house panel/OLS library.
    #[default]
    InHouse,
}

/// How far an allow-listed construct protects a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowListScope {
    /// Only the matched spans are protected; the rest of the file is rewritten.
    #[default]
    Construct,
    /// A file containing any allow-listed construct is left alone entirely.
    File,
}

/// Configuration for a [`crate::RewritePipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Rule set selection (default: in-house)
    pub rule_set: RuleSet,
    /// Allow-list protection scope (default: construct)
    pub allow_list_scope: AllowListScope,
    /// Upper bound on fixed-point iterations per rule (default 8)
    pub max_fixed_point_passes: usize,
    /// Module providing the in-house `Panel`
    pub panel_module: String,
    /// Module providing the in-house `OLS`
    pub ols_module: String,
    /// Expression used when a stacked collection is empty
    pub empty_fallback: String,
    /// Additional template rules appended to the catalog
    pub custom_rules: Vec<RuleSpec>,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            rule_set: RuleSet::InHouse,
            allow_list_scope: AllowListScope::Construct,
            max_fixed_point_passes: 8,
            panel_module: "aqr.core.panel".to_string(),
            ols_module: "aqr.stats.ols".to_string(),
            empty_fallback: "pd.Series(dtype=object)".to_string(),
            custom_rules: Vec::new(),
        }
    }
}

impl MigrateConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Config`] for malformed JSON or unknown enum values.
    pub fn from_json(json: &str) -> Result<Self, MigrateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn passes(&self) -> usize {
        self.max_fixed_point_passes.max(1)
    }
}
