//! Coarse structural summary: how many functions and classes a module defines.

use anyhow::Result;
use serde::Serialize;

use crate::parser::{for_each_node, named_children, parse};

/// Definition counts used to spot silently deleted code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    /// Functions defined at module level (decorated or not)
    pub top_level_functions: usize,
    /// Classes defined at module level (decorated or not)
    pub top_level_classes: usize,
    /// Functions anywhere, including methods and nested functions
    pub functions: usize,
    /// Classes anywhere
    pub classes: usize,
}

impl StructureSummary {
    /// Count definitions in `code`. Error-recovered trees are counted as-is.
    ///
    /// # Errors
    ///
    /// Fails only when the Python grammar cannot be loaded.
    pub fn of(code: &str) -> Result<Self> {
        let tree = parse(code)?;
        let root = tree.root_node();
        let mut summary = Self::default();

        for node in named_children(&root) {
            let definition = if node.kind() == "decorated_definition" {
                node.child_by_field_name("definition")
            } else {
                Some(node)
            };
            match definition.as_ref().map(tree_sitter::Node::kind) {
                Some("function_definition") => summary.top_level_functions += 1,
                Some("class_definition") => summary.top_level_classes += 1,
                _ => {}
            }
        }

        for_each_node(root, |node| match node.kind() {
            "function_definition" => summary.functions += 1,
            "class_definition" => summary.classes += 1,
            _ => {}
        });

        Ok(summary)
    }
}
