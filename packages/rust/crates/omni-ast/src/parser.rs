//! Tree-sitter parser setup and node helpers shared by the analysis modules.

use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser, Tree};

/// Tree-sitter based Python parser
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a parser with the Python grammar loaded.
    ///
    /// # Errors
    ///
    /// Fails when the grammar ABI does not match the linked tree-sitter runtime.
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .context("Failed to set Python language")?;
        Ok(Self { parser })
    }

    /// Parse `code` into a syntax tree.
    ///
    /// # Errors
    ///
    /// Fails only when tree-sitter gives up without producing a tree.
    pub fn parse(&mut self, code: &str) -> Result<Tree> {
        self.parser
            .parse(code, None)
            .context("tree-sitter produced no tree")
    }
}

pub(crate) fn parse(code: &str) -> Result<Tree> {
    PythonParser::new()?.parse(code)
}

pub(crate) fn node_text<'a>(node: &Node<'_>, code: &'a str) -> &'a str {
    node.utf8_text(code.as_bytes()).unwrap_or("")
}

pub(crate) fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Pre-order walk over every node below (and including) `root`.
pub(crate) fn for_each_node<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

pub(crate) fn line_of(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}
