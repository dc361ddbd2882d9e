//! Context-free rewrites: replace every occurrence of a template rule's pattern.

use tracing::debug;

use crate::catalog::RuleCatalog;
use crate::config::MigrateConfig;
use crate::matcher::PatternMatcher;
use crate::rule::Replacement;
use crate::types::{ChangeRecord, PassOutput};

/// Applies template rules in priority order, each one to a fixed point.
pub struct SimpleRewriter<'a> {
    catalog: &'a RuleCatalog,
    config: &'a MigrateConfig,
}

impl<'a> SimpleRewriter<'a> {
    /// Rewriter over the template rules of `catalog`.
    #[must_use]
    pub fn new(catalog: &'a RuleCatalog, config: &'a MigrateConfig) -> Self {
        Self { catalog, config }
    }

    /// Run every template rule over `text`.
    ///
    /// Rule N sees the output of rule N-1. A rule is re-applied while it still
    /// matches and still changes the text, up to the configured pass limit.
    #[must_use]
    pub fn apply(&self, text: String) -> PassOutput {
        let mut text = text;
        let mut changes = Vec::new();
        let mut requires = Vec::new();

        for rule in self.catalog.template_rules() {
            let Replacement::Template(template) = rule.replacement() else {
                continue;
            };
            let matcher = PatternMatcher::new(rule);
            let mut count = 0;
            let mut lines = Vec::new();

            for pass in 0..self.config.passes() {
                let found: Vec<usize> = matcher.sites(&text).map(|site| site.line).collect();
                if found.is_empty() {
                    break;
                }
                let next = rule.detect().replace_all(&text, template.as_str());
                if next == text {
                    break;
                }
                let next = next.into_owned();
                debug!(rule = rule.name(), pass, sites = found.len(), "applied template rule");
                count += found.len();
                lines.extend(found);
                text = next;
            }

            if count > 0 {
                lines.sort_unstable();
                lines.dedup();
                changes.push(ChangeRecord {
                    rule_name: rule.name().to_string(),
                    description: rule.description().to_string(),
                    count,
                    risk: rule.risk(),
                    lines,
                    error: None,
                });
                requires.extend(rule.requires_import().iter().cloned());
            }
        }

        PassOutput {
            text,
            changes,
            requires,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RewriteRule;

    fn rewrite(rules: Vec<RewriteRule>, text: &str) -> PassOutput {
        let catalog = RuleCatalog::from_rules(rules).expect("catalog");
        let config = MigrateConfig::default();
        SimpleRewriter::new(&catalog, &config).apply(text.to_string())
    }

    #[test]
    fn test_replace_all_counts_every_site() {
        let rule = RewriteRule::template("valid", r"\.valid\s*\(\s*\)", ".dropna()").expect("rule");
        let out = rewrite(vec![rule], "a.valid()\nb.valid( )\n");
        assert_eq!(out.text, "a.dropna()\nb.dropna()\n");
        assert_eq!(out.changes.len(), 1);
        assert_eq!(out.changes[0].count, 2);
        assert_eq!(out.changes[0].lines, vec![1, 2]);
    }

    #[test]
    fn test_later_rule_sees_earlier_output() {
        let first = RewriteRule::template("a_to_b", "aaa", "bbb")
            .expect("rule")
            .with_priority(1);
        let second = RewriteRule::template("b_to_c", "bbb", "ccc")
            .expect("rule")
            .with_priority(2);
        let out = rewrite(vec![second, first], "aaa");
        assert_eq!(out.text, "ccc");
        let names: Vec<&str> = out.changes.iter().map(|c| c.rule_name.as_str()).collect();
        assert_eq!(names, vec!["a_to_b", "b_to_c"]);
    }

    #[test]
    fn test_fixed_point_is_bounded() {
        // Each application creates a new match; the pass limit stops it.
        let rule = RewriteRule::template("grow", "x", "xx").expect("rule");
        let out = rewrite(vec![rule], "x");
        assert_eq!(out.text.len(), 1 << MigrateConfig::default().passes());
    }

    #[test]
    fn test_identity_template_records_nothing() {
        let rule = RewriteRule::template("same", "abc", "abc").expect("rule");
        let out = rewrite(vec![rule], "abc");
        assert!(out.changes.is_empty());
    }
}
