//! Top-level import discovery and the anchor where new imports belong.

use anyhow::Result;
use serde::Serialize;
use tree_sitter::Node;

use crate::parser::{line_of, named_children, node_text, parse};

/// One name bound by a top-level import statement.
///
/// `import a.b as c` yields `{module: "a.b", name: None, alias: Some("c")}`;
/// `from a import b as c` yields `{module: "a", name: Some("b"), alias: Some("c")}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBinding {
    /// Imported module path (relative imports keep their leading dots)
    pub module: String,
    /// Imported member for `from` imports
    pub name: Option<String>,
    /// `as` alias
    pub alias: Option<String>,
    /// 1-based line of the statement
    pub line: usize,
}

impl ImportBinding {
    /// The identifier this import binds in the module namespace.
    #[must_use]
    pub fn bound_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        if let Some(name) = &self.name {
            return name;
        }
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

fn is_import(kind: &str) -> bool {
    matches!(
        kind,
        "import_statement" | "import_from_statement" | "future_import_statement"
    )
}

/// Collect the bindings introduced by module-level import statements.
///
/// Imports nested in functions, classes or conditionals are ignored.
///
/// # Errors
///
/// Fails only when the Python grammar cannot be loaded.
pub fn collect_imports(code: &str) -> Result<Vec<ImportBinding>> {
    let tree = parse(code)?;
    let mut bindings = Vec::new();
    for statement in named_children(&tree.root_node()) {
        match statement.kind() {
            "import_statement" => {
                for item in named_children(&statement) {
                    if let Some((module, alias)) = dotted_or_aliased(&item, code) {
                        bindings.push(ImportBinding {
                            module,
                            name: None,
                            alias,
                            line: line_of(&statement),
                        });
                    }
                }
            }
            "import_from_statement" | "future_import_statement" => {
                let module_node = statement.child_by_field_name("module_name");
                let module = module_node
                    .as_ref()
                    .map_or("__future__", |node| node_text(node, code))
                    .to_string();
                let module_id = module_node.as_ref().map(Node::id);
                for item in named_children(&statement) {
                    if Some(item.id()) == module_id {
                        continue;
                    }
                    let (name, alias) = if item.kind() == "wildcard_import" {
                        ("*".to_string(), None)
                    } else if let Some(pair) = dotted_or_aliased(&item, code) {
                        pair
                    } else {
                        continue;
                    };
                    bindings.push(ImportBinding {
                        module: module.clone(),
                        name: Some(name),
                        alias,
                        line: line_of(&statement),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(bindings)
}

fn dotted_or_aliased(node: &Node<'_>, code: &str) -> Option<(String, Option<String>)> {
    match node.kind() {
        "dotted_name" => Some((node_text(node, code).to_string(), None)),
        "aliased_import" => {
            let name = node.child_by_field_name("name")?;
            let alias = node
                .child_by_field_name("alias")
                .map(|alias| node_text(&alias, code).to_string());
            Some((node_text(&name, code).to_string(), alias))
        }
        _ => None,
    }
}

/// Byte offset where new module-level imports should be inserted.
///
/// Right after the line holding the last top-level import; without imports,
/// after leading comments and the module docstring; otherwise the start of
/// the file. The offset always sits at a line start or at the end of `code`.
///
/// # Errors
///
/// Fails only when the Python grammar cannot be loaded.
pub fn import_insertion_offset(code: &str) -> Result<usize> {
    let tree = parse(code)?;
    let top = named_children(&tree.root_node());

    if let Some(last) = top.iter().rev().find(|node| is_import(node.kind())) {
        return Ok(line_end_after(code, last.end_byte()));
    }

    let mut offset = 0;
    for node in &top {
        match node.kind() {
            "comment" => offset = line_end_after(code, node.end_byte()),
            "expression_statement" if is_docstring(node) => {
                offset = line_end_after(code, node.end_byte());
                break;
            }
            _ => break,
        }
    }
    Ok(offset)
}

fn is_docstring(statement: &Node<'_>) -> bool {
    named_children(statement)
        .first()
        .is_some_and(|child| child.kind() == "string")
}

fn line_end_after(code: &str, byte: usize) -> usize {
    let byte = byte.min(code.len());
    code[byte..]
        .find('\n')
        .map_or(code.len(), |newline| byte + newline + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_name_variants() {
        let bindings =
            collect_imports("import os.path\nimport numpy as np\nfrom a.b import C as D\n")
                .expect("imports");
        let names: Vec<&str> = bindings.iter().map(ImportBinding::bound_name).collect();
        assert_eq!(names, vec!["os", "np", "D"]);
    }

    #[test]
    fn test_line_end_after_without_trailing_newline() {
        assert_eq!(line_end_after("import os", 9), 9);
        assert_eq!(line_end_after("import os\nx", 9), 10);
    }
}
