//! Statement-level method calls: `receiver.method(args)` standing alone as a statement.

use anyhow::Result;
use serde::Serialize;
use tree_sitter::Node;

use crate::parser::{for_each_node, line_of, named_children, node_text, parse};

/// One argument of a call, as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallArgument {
    /// `value`
    Positional {
        /// Source text of the expression
        value: String,
    },
    /// `name=value`
    Keyword {
        /// Keyword name
        name: String,
        /// Source text of the value expression
        value: String,
    },
    /// `*args` or `**kwargs`
    Splat {
        /// Source text including the stars
        value: String,
    },
}

/// A method call that is a whole expression statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementCall {
    /// Byte offset where the statement starts
    pub start: usize,
    /// Byte offset where the statement ends (exclusive)
    pub end: usize,
    /// Byte offset of the method name identifier
    pub method_start: usize,
    /// 1-based line of the statement
    pub line: usize,
    /// Source text of the receiver expression
    pub receiver: String,
    /// Arguments in source order
    pub arguments: Vec<CallArgument>,
}

/// Find every statement of the form `receiver.method(...)` in `code`.
///
/// Returns `Ok(None)` when the text does not parse cleanly: positions in an
/// error-recovered tree are not trustworthy enough to rewrite from.
///
/// # Errors
///
/// Fails only when the Python grammar cannot be loaded.
pub fn find_statement_calls(code: &str, method: &str) -> Result<Option<Vec<StatementCall>>> {
    let tree = parse(code)?;
    let root = tree.root_node();
    if root.has_error() {
        return Ok(None);
    }

    let mut calls = Vec::new();
    for_each_node(root, |node| {
        if node.kind() == "expression_statement" {
            calls.extend(statement_call(&node, code, method));
        }
    });
    Ok(Some(calls))
}

fn statement_call(statement: &Node<'_>, code: &str, method: &str) -> Option<StatementCall> {
    let children: Vec<Node<'_>> = named_children(statement)
        .into_iter()
        .filter(|child| child.kind() != "comment")
        .collect();
    let [call] = children.as_slice() else {
        return None;
    };
    if call.kind() != "call" {
        return None;
    }

    let function = call.child_by_field_name("function")?;
    if function.kind() != "attribute" {
        return None;
    }
    let attribute = function.child_by_field_name("attribute")?;
    if node_text(&attribute, code) != method {
        return None;
    }
    let receiver = function.child_by_field_name("object")?;
    let argument_list = call.child_by_field_name("arguments")?;
    if argument_list.kind() != "argument_list" {
        return None;
    }

    let arguments = named_children(&argument_list)
        .iter()
        .filter(|arg| arg.kind() != "comment")
        .map(|arg| call_argument(arg, code))
        .collect::<Option<Vec<_>>>()?;

    Some(StatementCall {
        start: statement.start_byte(),
        end: statement.end_byte(),
        method_start: attribute.start_byte(),
        line: line_of(statement),
        receiver: node_text(&receiver, code).to_string(),
        arguments,
    })
}

fn call_argument(node: &Node<'_>, code: &str) -> Option<CallArgument> {
    let argument = match node.kind() {
        "keyword_argument" => CallArgument::Keyword {
            name: node_text(&node.child_by_field_name("name")?, code).to_string(),
            value: node_text(&node.child_by_field_name("value")?, code).to_string(),
        },
        "list_splat" | "dictionary_splat" => CallArgument::Splat {
            value: node_text(node, code).to_string(),
        },
        _ => CallArgument::Positional {
            value: node_text(node, code).to_string(),
        },
    };
    Some(argument)
}
