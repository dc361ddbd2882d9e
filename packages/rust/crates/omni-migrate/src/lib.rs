#![allow(clippy::doc_markdown)]

//! omni-migrate - Rule-based rewriting of deprecated pandas APIs
//!
//! Takes Python source text written against a legacy pandas release and
//! produces equivalent text against the current API, with a change log, a
//! syntax check of the result and an import section patched to match.
//!
//! # Features
//!
//! - **Rule Catalog**: Priority-ordered template and contextual rules, extensible at runtime
//! - **Allow-list**: Legacy signatures that are never rewritten
//! - **Classification**: Single-scan decision whether a file needs work
//! - **Import Injection**: Adds the imports rewrites depend on, once
//! - **Syntax Validation**: Rewrites that break parsing are discarded
//! - **Batch Migration**: Parallel processing of many sources with rayon
//!
//! # Architecture
//!
//! ```text
//! omni-migrate/src/
//! ├── lib.rs          # Re-exports (this file)
//! ├── error.rs        # MigrateError / TransformError (thiserror)
//! ├── types.rs        # ChangeRecord, FileClassification, RewriteOutcome
//! ├── config.rs       # MigrateConfig (serde)
//! ├── rule.rs         # RewriteRule, RuleSpec, ImportRequirement
//! ├── matcher.rs      # PatternMatcher over a rule's detection regex
//! ├── catalog.rs      # RuleCatalog with the built-in rules
//! ├── allow.rs        # AllowList and span protection
//! ├── classify.rs     # CompatibilityClassifier (RegexSet)
//! ├── simple.rs       # Template pass
//! ├── contextual/     # Handler pass: ix, windows, accessors, guards, ols, ...
//! ├── imports.rs      # ImportInjector
//! ├── validate.rs     # SyntaxValidator (omni-ast)
//! ├── pipeline.rs     # RewritePipeline
//! ├── filter.rs       # Path safety filter
//! ├── diff.rs         # Unified diff utilities
//! └── batch.rs        # Parallel batch migration
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use omni_migrate::{MigrateConfig, RewritePipeline};
//!
//! let pipeline = RewritePipeline::new(MigrateConfig::default())?;
//! let outcome = pipeline.rewrite("import pandas as pd\ndf.sort('A')\n");
//! assert_eq!(outcome.text, "import pandas as pd\ndf.sort_values('A')\n");
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod allow;
mod batch;
mod catalog;
mod classify;
mod config;
mod contextual;
mod diff;
mod error;
mod filter;
mod imports;
mod matcher;
mod pipeline;
mod rule;
mod simple;
mod types;
mod validate;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use allow::{AllowList, ProtectedSpans, SpanKind};
pub use catalog::RuleCatalog;
pub use classify::CompatibilityClassifier;
pub use config::{AllowListScope, MigrateConfig, RuleSet};
pub use contextual::ContextualRewriter;
pub use error::{MigrateError, TransformError};
pub use imports::{ADD_IMPORTS, ImportInjector};
pub use matcher::{MatchSite, MatchSites, PatternMatcher};
pub use pipeline::RewritePipeline;
pub use rule::{HandlerKind, ImportRequirement, Replacement, RewriteRule, RuleSpec};
pub use simple::SimpleRewriter;
pub use types::{
    ChangeRecord, Compatibility, FileClassification, PassOutput, RewriteOutcome, Risk,
    StructuralIntegrityWarning, SyntaxVerdict, ValidationReport,
};
pub use validate::SyntaxValidator;

// Batch migration exports
pub use batch::{BatchReport, SourceFile};
pub use filter::{SkipReason, is_safe_to_modify};

// Diff utilities for previews
pub use diff::{LineChange, LineTag, changed_lines, generate_unified_diff};

pub use omni_ast::{StructureSummary, SyntaxFault};
