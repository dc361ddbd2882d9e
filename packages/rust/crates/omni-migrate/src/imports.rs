//! Import injection: add what the rewritten code needs, nothing it already has.

use std::sync::LazyLock;

use omni_ast::ImportBinding;
use regex::Regex;
use tracing::{debug, warn};

use crate::matcher::{compile_regex, line_at};
use crate::rule::ImportRequirement;
use crate::types::{ChangeRecord, Risk};

static FROM_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"^\s*from\s+([\w.]+)\s+import\s+(\w+)(?:\s+as\s+(\w+))?\s*$")
});
static PLAIN_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"^\s*import\s+([\w.]+)(?:\s+as\s+(\w+))?\s*$"));

/// Name of the change record emitted for inserted imports.
pub const ADD_IMPORTS: &str = "add_imports";

/// The binding an import statement would introduce.
#[derive(Debug, PartialEq, Eq)]
struct RequiredBinding<'a> {
    module: &'a str,
    name: Option<&'a str>,
    alias: Option<&'a str>,
}

impl<'a> RequiredBinding<'a> {
    fn parse(statement: &'a str) -> Option<Self> {
        if let Some(caps) = FROM_IMPORT.captures(statement) {
            return Some(Self {
                module: caps.get(1)?.as_str(),
                name: Some(caps.get(2)?.as_str()),
                alias: caps.get(3).map(|m| m.as_str()),
            });
        }
        let caps = PLAIN_IMPORT.captures(statement)?;
        Some(Self {
            module: caps.get(1)?.as_str(),
            name: None,
            alias: caps.get(2).map(|m| m.as_str()),
        })
    }

    fn matches(&self, binding: &ImportBinding) -> bool {
        binding.module == self.module
            && binding.name.as_deref() == self.name
            && binding.alias.as_deref() == self.alias
    }
}

/// Inserts missing imports after the last top-level import.
pub struct ImportInjector;

impl ImportInjector {
    /// Add the requirements `text` does not already satisfy.
    ///
    /// Requirements are deduplicated in declaration order. Returns the new
    /// text and, when anything was inserted, an `add_imports` change record.
    #[must_use]
    pub fn inject(text: &str, requirements: &[ImportRequirement]) -> (String, Option<ChangeRecord>) {
        if requirements.is_empty() {
            return (text.to_string(), None);
        }
        let bindings = omni_ast::collect_imports(text).unwrap_or_else(|err| {
            warn!(error = %err, "import discovery failed; relying on textual checks");
            Vec::new()
        });

        let mut missing: Vec<&str> = Vec::new();
        for requirement in requirements {
            let statement = requirement.statement.trim();
            if missing.contains(&statement) || is_satisfied(text, &bindings, requirement) {
                continue;
            }
            missing.push(statement);
        }
        if missing.is_empty() {
            return (text.to_string(), None);
        }

        let offset = omni_ast::import_insertion_offset(text).unwrap_or(0);
        let mut block = String::new();
        if offset == text.len() && !text.is_empty() && !text.ends_with('\n') {
            block.push('\n');
        }
        for statement in &missing {
            block.push_str(statement);
            block.push('\n');
        }

        let mut out = String::with_capacity(text.len() + block.len());
        out.push_str(&text[..offset]);
        out.push_str(&block);
        out.push_str(&text[offset..]);

        let first_line = line_at(&out, offset + usize::from(block.starts_with('\n')));
        debug!(imports = missing.len(), line = first_line, "inserted imports");
        let record = ChangeRecord {
            rule_name: ADD_IMPORTS.to_string(),
            description: format!("Added imports: {}", missing.join("; ")),
            count: missing.len(),
            risk: Risk::Low,
            lines: (first_line..first_line + missing.len()).collect(),
            error: None,
        };
        (out, Some(record))
    }
}

fn is_satisfied(text: &str, bindings: &[ImportBinding], requirement: &ImportRequirement) -> bool {
    let statement = requirement.statement.trim();
    if text.lines().any(|line| line.trim() == statement) {
        return true;
    }
    if let Some(marker) = &requirement.marker {
        if text.contains(marker.as_str()) {
            return true;
        }
    }
    RequiredBinding::parse(statement)
        .is_some_and(|required| bindings.iter().any(|binding| required.matches(binding)))
}
