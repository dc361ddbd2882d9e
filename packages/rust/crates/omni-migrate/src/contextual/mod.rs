//! Contextual rewrites: handlers whose output depends on argument shape or
//! on the text around the match.
//!
//! Each handler turns one [`MatchSite`] into at most one [`SiteEdit`]. The
//! driver collects the edits of a full scan, drops edits that overlap an
//! earlier one, applies the rest back to front, and rescans until the rule
//! stops producing edits.

mod accessor;
pub(crate) mod args;
mod constructor;
mod guard;
mod indexer;
mod stats;
mod subtraction;
mod windowed;

use std::cell::OnceCell;

use tracing::{debug, warn};

use crate::catalog::RuleCatalog;
use crate::config::MigrateConfig;
use crate::error::TransformError;
use crate::matcher::{MatchSite, PatternMatcher};
use crate::rule::{HandlerKind, ImportRequirement, Replacement, RewriteRule};
use crate::types::{ChangeRecord, PassOutput};

/// What a handler sees besides the site itself.
pub(crate) struct SiteContext<'t> {
    pub text: &'t str,
    pub config: &'t MigrateConfig,
    set_value_calls: OnceCell<Option<Vec<omni_ast::StatementCall>>>,
}

impl<'t> SiteContext<'t> {
    fn new(text: &'t str, config: &'t MigrateConfig) -> Self {
        Self {
            text,
            config,
            set_value_calls: OnceCell::new(),
        }
    }

    /// Statement-level `.set_value(...)` calls, parsed once per scan.
    ///
    /// `None` when the text does not parse cleanly.
    pub(crate) fn set_value_statements(&self) -> Option<&[omni_ast::StatementCall]> {
        self.set_value_calls
            .get_or_init(|| match omni_ast::find_statement_calls(self.text, "set_value") {
                Ok(calls) => calls,
                Err(err) => {
                    warn!(error = %err, "statement index unavailable");
                    None
                }
            })
            .as_deref()
    }
}

/// A named piece of a rewrite, reported as its own change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fragment {
    pub name: String,
    pub description: String,
}

/// Replacement of `start..end` computed by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SiteEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
    pub fragments: Vec<Fragment>,
    pub requires: Vec<ImportRequirement>,
}

impl SiteEdit {
    pub(crate) fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
            fragments: Vec::new(),
            requires: Vec::new(),
        }
    }

    pub(crate) fn fragment(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.fragments.push(Fragment {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    pub(crate) fn requiring(mut self, requirement: ImportRequirement) -> Self {
        self.requires.push(requirement);
        self
    }
}

pub(crate) type SiteResult = Result<Option<SiteEdit>, TransformError>;

/// One contextual rewrite strategy.
pub(crate) trait ContextualHandler: Sync {
    /// Rewrite one site; `Ok(None)` when the site is not applicable.
    fn rewrite_site(&self, cx: &SiteContext<'_>, site: &MatchSite<'_, '_>) -> SiteResult;

    /// Post-processing once the rule reached its fixed point.
    fn finish(&self, text: String) -> String {
        text
    }
}

fn handler_for(kind: HandlerKind) -> &'static dyn ContextualHandler {
    match kind {
        HandlerKind::AmbiguousIndexer => &indexer::AmbiguousIndexer,
        HandlerKind::WindowedAggregation => &windowed::WindowedAggregation,
        HandlerKind::GetValue => &accessor::GetValue,
        HandlerKind::SetValue => &accessor::SetValue,
        HandlerKind::EmptyCollectionGuard => &guard::EmptyCollectionGuard,
        HandlerKind::BinarySubtraction => &subtraction::BinarySubtraction,
        HandlerKind::StatisticalCall => &stats::StatisticalCall,
        HandlerKind::DatetimeIndexConstructor => &constructor::DatetimeIndexConstructor,
    }
}

/// Change records of one rule, merged by fragment name in first-seen order.
#[derive(Default)]
struct Tally {
    fragments: Vec<(Fragment, usize, Vec<usize>)>,
    requires: Vec<ImportRequirement>,
}

impl Tally {
    fn record(&mut self, rule: &RewriteRule, line: usize, edit: &SiteEdit) {
        let default = [Fragment {
            name: rule.name().to_string(),
            description: rule.description().to_string(),
        }];
        let fragments = if edit.fragments.is_empty() {
            &default[..]
        } else {
            &edit.fragments[..]
        };
        for fragment in fragments {
            match self.fragments.iter_mut().find(|(f, _, _)| f.name == fragment.name) {
                Some((_, count, lines)) => {
                    *count += 1;
                    lines.push(line);
                }
                None => self.fragments.push((fragment.clone(), 1, vec![line])),
            }
        }
        self.requires.extend(edit.requires.iter().cloned());
    }
}

/// Applies handler rules in priority order, each one to a fixed point.
pub struct ContextualRewriter<'a> {
    catalog: &'a RuleCatalog,
    config: &'a MigrateConfig,
}

impl<'a> ContextualRewriter<'a> {
    /// Rewriter over the handler rules of `catalog`.
    #[must_use]
    pub fn new(catalog: &'a RuleCatalog, config: &'a MigrateConfig) -> Self {
        Self { catalog, config }
    }

    /// Run every handler rule over `text`.
    #[must_use]
    pub fn apply(&self, text: String) -> PassOutput {
        let mut output = PassOutput {
            text,
            ..PassOutput::default()
        };
        for rule in self.catalog.contextual_rules() {
            let Replacement::Handler(kind) = rule.replacement() else {
                continue;
            };
            let text = std::mem::take(&mut output.text);
            output.text = self.apply_rule(rule, handler_for(*kind), text, &mut output);
        }
        output
    }

    fn apply_rule(
        &self,
        rule: &RewriteRule,
        handler: &dyn ContextualHandler,
        mut text: String,
        output: &mut PassOutput,
    ) -> String {
        let matcher = PatternMatcher::new(rule);
        let mut tally = Tally::default();
        let mut failures: Vec<(usize, TransformError)> = Vec::new();

        for pass in 0..self.config.passes() {
            let mut edits: Vec<(usize, SiteEdit)> = Vec::new();
            failures.clear();
            {
                let cx = SiteContext::new(&text, self.config);
                for site in matcher.sites(&text) {
                    if site.start == site.end {
                        continue;
                    }
                    match handler.rewrite_site(&cx, &site) {
                        Ok(Some(edit)) => edits.push((site.line, edit)),
                        Ok(None) => {}
                        Err(err) => failures.push((site.line, err)),
                    }
                }
            }

            let edits = non_overlapping(edits);
            if edits.is_empty() {
                break;
            }
            debug!(rule = rule.name(), pass, edits = edits.len(), "applying contextual edits");
            for (line, edit) in &edits {
                tally.record(rule, *line, edit);
            }
            for (_, edit) in edits.iter().rev() {
                text.replace_range(edit.start..edit.end, &edit.replacement);
            }
        }

        let text = handler.finish(text);

        let fired = !tally.fragments.is_empty();
        for (fragment, count, mut lines) in tally.fragments {
            lines.sort_unstable();
            lines.dedup();
            output.changes.push(ChangeRecord {
                rule_name: fragment.name,
                description: fragment.description,
                count,
                risk: rule.risk(),
                lines,
                error: None,
            });
        }
        for (line, err) in failures {
            warn!(rule = rule.name(), line, error = %err, "site left unmodified");
            output.changes.push(ChangeRecord {
                rule_name: rule.name().to_string(),
                description: rule.description().to_string(),
                count: 0,
                risk: rule.risk(),
                lines: vec![line],
                error: Some(err.message().to_string()),
            });
        }
        if fired {
            output.requires.extend(tally.requires);
            output.requires.extend(rule.requires_import().iter().cloned());
        }
        text
    }
}

/// Keep edits in offset order, dropping any that overlaps an earlier kept edit.
fn non_overlapping(mut edits: Vec<(usize, SiteEdit)>) -> Vec<(usize, SiteEdit)> {
    edits.sort_by(|(_, a), (_, b)| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut kept: Vec<(usize, SiteEdit)> = Vec::with_capacity(edits.len());
    for (line, edit) in edits {
        if kept.last().is_none_or(|(_, last)| edit.start >= last.end) {
            kept.push((line, edit));
        }
    }
    kept
}
