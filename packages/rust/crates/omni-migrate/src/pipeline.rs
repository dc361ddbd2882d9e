//! The rewrite pipeline: protect, rewrite, restore, inject imports, validate.

use tracing::{debug, warn};

use crate::allow::AllowList;
use crate::catalog::{RuleCatalog, pass_name};
use crate::classify::CompatibilityClassifier;
use crate::config::{AllowListScope, MigrateConfig};
use crate::contextual::ContextualRewriter;
use crate::error::MigrateError;
use crate::imports::ImportInjector;
use crate::rule::{RewriteRule, RuleSpec};
use crate::simple::SimpleRewriter;
use crate::types::{
    Compatibility, FileClassification, RewriteOutcome, SyntaxVerdict, ValidationReport,
};
use crate::validate::SyntaxValidator;

/// Orchestrates one rewrite per call over a frozen catalog.
///
/// `rewrite` borrows the pipeline immutably, so the catalog cannot change
/// during a run and one pipeline can serve many threads.
#[derive(Debug, Clone)]
pub struct RewritePipeline {
    config: MigrateConfig,
    catalog: RuleCatalog,
    classifier: CompatibilityClassifier,
}

impl RewritePipeline {
    /// Pipeline over the built-in catalog for `config`.
    ///
    /// # Errors
    ///
    /// Fails when the Python grammar cannot be loaded, a pattern does not
    /// compile, or two rules share a name.
    pub fn new(config: MigrateConfig) -> Result<Self, MigrateError> {
        let catalog = RuleCatalog::builtin(&config)?;
        Self::with_catalog(config, catalog)
    }

    /// Pipeline over an explicit catalog.
    ///
    /// # Errors
    ///
    /// Same as [`RewritePipeline::new`].
    pub fn with_catalog(config: MigrateConfig, catalog: RuleCatalog) -> Result<Self, MigrateError> {
        omni_ast::PythonParser::new().map_err(|err| MigrateError::Parser(err.to_string()))?;
        let classifier = CompatibilityClassifier::new(&catalog, AllowList::builtin())?;
        Ok(Self {
            config,
            catalog,
            classifier,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MigrateConfig {
        &self.config
    }

    /// Active catalog.
    #[must_use]
    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Extend the catalog with `rule` for subsequent calls.
    ///
    /// # Errors
    ///
    /// [`MigrateError::DuplicateRule`] when the name is taken.
    pub fn add_custom_rule(&mut self, rule: RewriteRule) -> Result<(), MigrateError> {
        let catalog = self.catalog.with_rule(rule)?;
        self.classifier =
            CompatibilityClassifier::new(&catalog, self.classifier.allow_list().clone())?;
        self.catalog = catalog;
        Ok(())
    }

    /// Compile `spec` and extend the catalog with it.
    ///
    /// # Errors
    ///
    /// Detection, validation or duplicate-name errors for `spec`.
    pub fn add_rule_spec(&mut self, spec: &RuleSpec) -> Result<(), MigrateError> {
        self.add_custom_rule(RewriteRule::from_spec(spec)?)
    }

    /// Decide whether `text` needs rewriting.
    #[must_use]
    pub fn classify(&self, text: &str) -> FileClassification {
        self.classifier.classify(text)
    }

    /// Rewrite `text` regardless of its classification.
    ///
    /// Allow-listed constructs are never modified. With
    /// [`AllowListScope::File`], a file containing any of them is returned as is.
    #[must_use]
    pub fn rewrite(&self, text: &str) -> RewriteOutcome {
        let classification = self.classify(text);
        if self.config.allow_list_scope == AllowListScope::File
            && !classification.protected.is_empty()
        {
            return skipped(text, classification);
        }
        self.run(text, classification)
    }

    /// Classify, then rewrite unless the file does not use pandas.
    #[must_use]
    pub fn process(&self, text: &str) -> RewriteOutcome {
        let classification = self.classify(text);
        if classification.state == Compatibility::NotApplicable {
            return skipped(text, classification);
        }
        if self.config.allow_list_scope == AllowListScope::File
            && !classification.protected.is_empty()
        {
            return skipped(text, classification);
        }
        self.run(text, classification)
    }

    fn run(&self, original: &str, classification: FileClassification) -> RewriteOutcome {
        let (working, protected) = self.classifier.allow_list().protect(original);
        if !protected.is_empty() {
            debug!(spans = protected.len(), "protected allow-listed spans");
        }

        let simple = SimpleRewriter::new(&self.catalog, &self.config).apply(working);
        let contextual = ContextualRewriter::new(&self.catalog, &self.config).apply(simple.text);

        let mut changes = simple.changes;
        changes.extend(contextual.changes);
        let mut requires = simple.requires;
        requires.extend(contextual.requires);

        let restored = protected.restore(&contextual.text);
        let (text, import_change) = ImportInjector::inject(&restored, &requires);
        changes.extend(import_change);

        for change in &changes {
            if let Some(rule) = self.catalog.get(&change.rule_name) {
                debug!(
                    rule = %change.rule_name,
                    pass = pass_name(rule),
                    count = change.count,
                    "change recorded"
                );
            }
        }

        let validation = SyntaxValidator::validate(original, &text);
        if validation.is_fatal() {
            if let SyntaxVerdict::Regression { fault } = &validation.verdict {
                warn!(
                    line = fault.line,
                    column = fault.column,
                    message = %fault.message,
                    "rewrite broke parsing; keeping original text"
                );
            }
            return RewriteOutcome {
                text: original.to_string(),
                changes,
                validation,
                classification,
                applied: false,
            };
        }

        RewriteOutcome {
            text,
            changes,
            validation,
            classification,
            applied: true,
        }
    }
}

fn skipped(text: &str, classification: FileClassification) -> RewriteOutcome {
    RewriteOutcome {
        text: text.to_string(),
        changes: Vec::new(),
        validation: ValidationReport::skipped(),
        classification,
        applied: false,
    }
}
