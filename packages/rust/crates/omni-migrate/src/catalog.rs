//! The rule catalog: one canonical list of rewrites, sorted and frozen.

use crate::config::{MigrateConfig, RuleSet};
use crate::error::MigrateError;
use crate::rule::{HandlerKind, ImportRequirement, Replacement, RewriteRule};
use crate::types::Risk;

const PD: &str = r"\b(pd|pandas)";

/// Immutable, priority-ordered set of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: Vec<RewriteRule>,
}

impl RuleCatalog {
    /// Canonical catalog for `config.rule_set`, followed by `config.custom_rules`.
    ///
    /// # Errors
    ///
    /// Fails when a pattern does not compile or two rules share a name.
    pub fn builtin(config: &MigrateConfig) -> Result<Self, MigrateError> {
        let mut catalog = Self::from_rules(builtin_rules(config)?)?;
        for spec in &config.custom_rules {
            catalog.insert(RewriteRule::from_spec(spec)?)?;
        }
        catalog.sort();
        Ok(catalog)
    }

    /// Catalog from an explicit rule list.
    ///
    /// # Errors
    ///
    /// [`MigrateError::DuplicateRule`] when two rules share a name.
    pub fn from_rules(rules: Vec<RewriteRule>) -> Result<Self, MigrateError> {
        let mut catalog = Self::default();
        for rule in rules {
            catalog.insert(rule)?;
        }
        catalog.sort();
        Ok(catalog)
    }

    /// Copy of this catalog extended with `rule`.
    ///
    /// A rule without an explicit priority lands after every existing rule.
    ///
    /// # Errors
    ///
    /// [`MigrateError::DuplicateRule`] when the name is taken.
    pub fn with_rule(&self, rule: RewriteRule) -> Result<Self, MigrateError> {
        let mut extended = self.clone();
        extended.insert(rule)?;
        extended.sort();
        Ok(extended)
    }

    fn insert(&mut self, mut rule: RewriteRule) -> Result<(), MigrateError> {
        if self.get(rule.name()).is_some() {
            return Err(MigrateError::DuplicateRule(rule.name().to_string()));
        }
        let next = self
            .rules
            .iter()
            .map(RewriteRule::priority)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        rule.resolve_priority(next);
        self.rules.push(rule);
        Ok(())
    }

    // Stable: equal priorities keep insertion order.
    fn sort(&mut self) {
        self.rules.sort_by_key(RewriteRule::priority);
    }

    /// Rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RewriteRule> {
        self.rules.iter().find(|rule| rule.name() == name)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Template rules in application order.
    pub fn template_rules(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter().filter(|rule| !rule.is_contextual())
    }

    /// Handler rules in application order.
    pub fn contextual_rules(&self) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter().filter(|rule| rule.is_contextual())
    }
}

fn template_literal(text: &str) -> String {
    text.replace('$', "$$")
}

#[allow(clippy::too_many_lines)]
fn builtin_rules(config: &MigrateConfig) -> Result<Vec<RewriteRule>, MigrateError> {
    let in_house = config.rule_set == RuleSet::InHouse;
    let panel_import = format!("from {} import Panel", config.panel_module);
    let ols_import = format!("from {} import OLS", config.ols_module);
    let mut rules = Vec::new();

    // Imports
    rules.push(
        RewriteRule::template(
            "datetimeindex_import",
            r"(?m)^([ \t]*)from\s+pandas\.tseries\.offsets\s+import\s+DatetimeIndex[ \t]*$",
            "${1}from pandas import DatetimeIndex",
        )?
        .with_priority(10)
        .with_description("DatetimeIndex moved to the pandas top-level namespace"),
    );
    if in_house {
        rules.push(
            RewriteRule::template(
                "panel_import",
                r"(?m)^([ \t]*)from\s+pandas\s+import\s+Panel[ \t]*$",
                format!("${{1}}{}", template_literal(&panel_import)),
            )?
            .with_priority(10)
            .with_risk(Risk::Medium)
            .with_description("pandas.Panel import -> in-house Panel"),
        );
        rules.push(
            RewriteRule::template(
                "ols_import",
                r"(?m)^([ \t]*)from\s+pandas\.stats\.api\s+import\s+ols[ \t]*$",
                format!("${{1}}{} as ols", template_literal(&ols_import)),
            )?
            .with_priority(10)
            .with_risk(Risk::Medium)
            .with_description("pandas.stats.api.ols import -> in-house OLS"),
        );
    }

    // Method renames
    rules.push(
        RewriteRule::template(
            "sort_to_sort_values",
            r"\.sort\s*\((\s*[^\s)])",
            ".sort_values(${1}",
        )?
        .with_priority(20)
        .with_risk(Risk::Medium)
        .with_description(".sort() -> .sort_values()"),
    );
    rules.push(
        RewriteRule::template("valid_to_dropna", r"\.valid\s*\(\s*\)", ".dropna()")?
            .with_priority(20)
            .with_description(".valid() -> .dropna()"),
    );
    rules.push(
        RewriteRule::template("as_matrix_to_values", r"\.as_matrix\s*\(\s*\)", ".values")?
            .with_priority(20)
            .with_description(".as_matrix() -> .values"),
    );
    rules.push(
        RewriteRule::template(
            "convert_objects_to_infer_objects",
            r"\.convert_objects\s*\(\s*\)",
            ".infer_objects()",
        )?
        .with_priority(20)
        .with_description(".convert_objects() -> .infer_objects()"),
    );
    rules.push(
        RewriteRule::template(
            "categorical_order_to_ordered",
            &format!(
                r"(?P<head>{PD}\.Categorical\s*\((?:(?:[^()]|\([^()]*\))*?,)?\s*)order(?P<eq>\s*=)"
            ),
            "${head}ordered${eq}",
        )?
        .with_priority(20)
        .with_description("pd.Categorical(order=...) -> pd.Categorical(ordered=...)"),
    );
    rules.push(
        RewriteRule::template(
            "sortlevel_default",
            r"\.sortlevel\s*\(\s*\)",
            ".sort_index(level=0)",
        )?
        .with_priority(25)
        .with_description(".sortlevel() -> .sort_index(level=0)"),
    );
    rules.push(
        RewriteRule::template(
            "sortlevel_level_keyword",
            r"\.sortlevel\s*\(\s*level\s*=",
            ".sort_index(level=",
        )?
        .with_priority(25)
        .with_description(".sortlevel(level=...) -> .sort_index(level=...)"),
    );
    rules.push(
        RewriteRule::template(
            "sortlevel_keyword_only",
            r"\.sortlevel\s*\(\s*([A-Za-z_]\w*\s*=[^=])",
            ".sort_index(level=0, ${1}",
        )?
        .with_priority(25)
        .with_description(".sortlevel(kw=...) -> .sort_index(level=0, kw=...)"),
    );
    rules.push(
        RewriteRule::template(
            "sortlevel_to_sort_index",
            r"\.sortlevel\s*\(\s*",
            ".sort_index(level=",
        )?
        .with_priority(25)
        .with_description(".sortlevel(n) -> .sort_index(level=n)"),
    );

    // Namespace changes
    rules.push(
        RewriteRule::template(
            "timegrouper_positional_freq",
            &format!(
                r#"{PD}\.TimeGrouper\s*\(\s*('[^'\n]*'|"[^"\n]*"|[A-Za-z_][\w.]*)\s*([,)])"#
            ),
            "${1}.Grouper(freq=${2}${3}",
        )?
        .with_priority(30)
        .with_description("pd.TimeGrouper(f) -> pd.Grouper(freq=f)"),
    );
    rules.push(
        RewriteRule::template(
            "timegrouper_to_grouper",
            &format!(r"{PD}\.TimeGrouper\s*\("),
            "${1}.Grouper(",
        )?
        .with_priority(30)
        .with_description("pd.TimeGrouper -> pd.Grouper"),
    );
    rules.push(
        RewriteRule::template(
            "to_timedelta_months",
            &format!(
                r#"{PD}\.to_timedelta\s*\(\s*(\d+)\s*,\s*unit\s*=\s*['"]M['"]\s*\)"#
            ),
            "${1}.DateOffset(months=${2})",
        )?
        .with_priority(30)
        .with_risk(Risk::Medium)
        .with_description("pd.to_timedelta(n, unit='M') -> pd.DateOffset(months=n)"),
    );
    if in_house {
        rules.push(
            RewriteRule::template("pd_panel", &format!(r"{PD}\.Panel\s*\("), "Panel(")?
                .with_priority(40)
                .with_risk(Risk::High)
                .with_description("pd.Panel -> in-house Panel")
                .requiring(ImportRequirement::new(panel_import.clone())),
        );
    }

    // Contextual handlers
    rules.push(
        RewriteRule::handler("ix_indexer", r"\.ix\s*\[", HandlerKind::AmbiguousIndexer)?
            .with_priority(100)
            .with_risk(Risk::Medium)
            .with_description(".ix[] -> .loc[] / .iloc[]"),
    );
    rules.push(
        RewriteRule::handler(
            "windowed_aggregation",
            &format!(
                r"{PD}\.(?:(?P<family>rolling|expanding)_(?P<agg>[A-Za-z_]+)|ewm(?P<ewm>a|std|var|vol|corr|cov))\s*\("
            ),
            HandlerKind::WindowedAggregation,
        )?
        .with_priority(110)
        .with_risk(Risk::Medium)
        .with_description("pd.rolling_*/expanding_*/ewm* -> method chains"),
    );
    rules.push(
        RewriteRule::handler("get_value_to_at", r"\.get_value\s*\(", HandlerKind::GetValue)?
            .with_priority(120)
            .with_description(".get_value() -> .at[]"),
    );
    rules.push(
        RewriteRule::handler("set_value_to_at", r"\.set_value\s*\(", HandlerKind::SetValue)?
            .with_priority(121)
            .with_risk(Risk::Medium)
            .with_description(".set_value() -> .at[] assignment"),
    );
    rules.push(
        RewriteRule::handler(
            "datetimeindex_constructor",
            &format!(r"{PD}\.DatetimeIndex\s*\("),
            HandlerKind::DatetimeIndexConstructor,
        )?
        .with_priority(130)
        .with_description("pd.DatetimeIndex(start, end, freq) -> pd.date_range()")
        .untracked(),
    );
    if in_house {
        rules.push(
            RewriteRule::handler(
                "ols_call",
                &format!(r"{PD}\.(?:stats\.ols\.OLS|ols)\s*\("),
                HandlerKind::StatisticalCall,
            )?
            .with_priority(140)
            .with_risk(Risk::High)
            .with_description("pd.ols() -> OLS() / statsmodels"),
        );
    }
    rules.push(
        RewriteRule::handler(
            "frame_column_subtraction",
            r"\b([A-Za-z_]\w*)\s*-\s*([A-Za-z_]\w*)\s*\[",
            HandlerKind::BinarySubtraction,
        )?
        .with_priority(150)
        .with_risk(Risk::Medium)
        .with_description("df - df[col] -> df.sub(df[col], axis=0)")
        .untracked(),
    );

    let mut guard = RewriteRule::handler(
        "empty_stack_guard",
        r"\b([A-Za-z_][\w.]*)\.stack\s*\(\s*\)",
        HandlerKind::EmptyCollectionGuard,
    )?
    .with_priority(160)
    .with_risk(Risk::Medium)
    .with_description("guard .stack() against empty input")
    .untracked();
    if config.empty_fallback.contains("pd.") {
        guard = guard.requiring(ImportRequirement::new("import pandas as pd"));
    }
    rules.push(guard);

    Ok(rules)
}

/// Whether `rule` rewrites through a template or a handler, for logs.
pub(crate) fn pass_name(rule: &RewriteRule) -> &'static str {
    match rule.replacement() {
        Replacement::Template(_) => "simple",
        Replacement::Handler(_) => "contextual",
    }
}
