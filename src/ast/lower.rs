// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Lowering from the tree-sitter CST to the closed statement AST.

use tree_sitter::{Node, Parser, Point};

use super::{ExceptHandler, Module, ParseError, Stmt};

/// Statement kinds that are plain one-step flow with no special wiring.
const PASSTHROUGH_KINDS: &[&str] = &[
    "import_statement",
    "import_from_statement",
    "future_import_statement",
    "global_statement",
    "nonlocal_statement",
    "delete_statement",
    "assert_statement",
    "type_alias_statement",
];

const UNKNOWN_TEXT_MAX: usize = 60;

pub(super) fn lower_source(source: &str) -> Result<Module, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| ParseError::Grammar {
            message: err.to_string(),
        })?;

    let tree = parser.parse(source, None).ok_or(ParseError::Unparseable)?;
    let root = tree.root_node();
    if root.has_error() {
        let point = first_error_point(root).unwrap_or_else(|| root.start_position());
        return Err(ParseError::Syntax {
            line: point.row.saturating_add(1),
            column: point.column.saturating_add(1),
        });
    }

    Ok(Module {
        body: lower_block(source, root, true),
    })
}

fn first_error_point(node: Node<'_>) -> Option<Point> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position());
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(point) = first_error_point(child) {
            return Some(point);
        }
    }
    Some(node.start_position())
}

/// Lower a statement list. `strip_docstring` skips a leading bare string
/// expression (module and function docstrings).
fn lower_block(source: &str, block: Node<'_>, strip_docstring: bool) -> Vec<Stmt> {
    let mut out = Vec::new();
    let mut first = true;

    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        if child.kind() == "comment" {
            continue;
        }
        let skip_string = strip_docstring && first;
        first = false;
        if skip_string && is_bare_string(child) {
            continue;
        }
        lower_stmt_into(source, child, &mut out);
    }

    out
}

fn lower_field_block(
    source: &str,
    parent: Node<'_>,
    field: &str,
    strip_docstring: bool,
) -> Vec<Stmt> {
    match parent.child_by_field_name(field) {
        Some(block) => lower_block(source, block, strip_docstring),
        None => Vec::new(),
    }
}

fn lower_stmt_into(source: &str, node: Node<'_>, out: &mut Vec<Stmt>) {
    match node.kind() {
        "expression_statement" => {
            if let Some(stmt) = lower_expression_statement(source, node) {
                out.push(stmt);
            }
        }
        "if_statement" => out.push(lower_if(source, node)),
        "while_statement" => {
            let test = field_text(source, node, "condition");
            let body = lower_field_block(source, node, "body", false);
            out.push(Stmt::While { test, body });
            // A loop `else` runs when the loop falls through without break;
            // approximate it as statements following the loop.
            lower_loop_else_into(source, node, out);
        }
        "for_statement" => {
            let target = field_text(source, node, "left");
            let iter = field_text(source, node, "right");
            let body = lower_field_block(source, node, "body", false);
            out.push(Stmt::For { target, iter, body });
            lower_loop_else_into(source, node, out);
        }
        "function_definition" => {
            let name = field_text(source, node, "name");
            let body = lower_field_block(source, node, "body", true);
            out.push(Stmt::FunctionDef { name, body });
        }
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                lower_stmt_into(source, definition, out);
            }
        }
        "return_statement" => out.push(Stmt::Return {
            value: first_expression_text(source, node),
        }),
        "raise_statement" => out.push(Stmt::Raise {
            value: first_expression_text(source, node),
        }),
        "break_statement" => out.push(Stmt::Break),
        "continue_statement" => out.push(Stmt::Continue),
        "pass_statement" => out.push(Stmt::Pass),
        "try_statement" => out.push(lower_try(source, node)),
        "with_statement" => {
            let binding = node
                .named_children(&mut node.walk())
                .find(|child| child.kind() == "with_clause")
                .map(|clause| label_text(source, clause))
                .unwrap_or_default();
            let body = lower_field_block(source, node, "body", false);
            out.push(Stmt::With { binding, body });
        }
        kind if PASSTHROUGH_KINDS.contains(&kind) => out.push(Stmt::Step {
            text: label_text(source, node),
        }),
        kind => out.push(Stmt::Unknown {
            construct: kind.to_owned(),
            text: unknown_text(source, node),
        }),
    }
}

fn lower_expression_statement(source: &str, node: Node<'_>) -> Option<Stmt> {
    let inner = node
        .named_children(&mut node.walk())
        .find(|child| child.kind() != "comment")?;

    match inner.kind() {
        // Bare string literals are documentation, not steps.
        "string" | "concatenated_string" => None,
        "call" => {
            let text = label_text(source, node);
            if is_io_call(source, inner) {
                Some(Stmt::IoStep { text })
            } else {
                Some(Stmt::Step { text })
            }
        }
        "assignment" | "augmented_assignment" => {
            let text = label_text(source, node);
            let reads_input = inner
                .child_by_field_name("right")
                .is_some_and(|right| subtree_reads_input(source, right));
            if reads_input {
                Some(Stmt::IoStep { text })
            } else {
                Some(Stmt::Step { text })
            }
        }
        _ => Some(Stmt::Step {
            text: label_text(source, node),
        }),
    }
}

fn lower_if(source: &str, node: Node<'_>) -> Stmt {
    let test = field_text(source, node, "condition");
    let then_body = lower_field_block(source, node, "consequence", false);

    let mut alternatives = Vec::new();
    let mut cursor = node.walk();
    for alt in node.children_by_field_name("alternative", &mut cursor) {
        alternatives.push(alt);
    }

    // Fold the elif/else chain from the back so each elif becomes a nested
    // `If` hanging off the previous condition's else side.
    let mut else_body = Vec::new();
    for alt in alternatives.into_iter().rev() {
        match alt.kind() {
            "else_clause" => {
                else_body = lower_field_block(source, alt, "body", false);
            }
            "elif_clause" => {
                let elif = Stmt::If {
                    test: field_text(source, alt, "condition"),
                    then_body: lower_field_block(source, alt, "consequence", false),
                    else_body,
                };
                else_body = vec![elif];
            }
            _ => {}
        }
    }

    Stmt::If {
        test,
        then_body,
        else_body,
    }
}

fn lower_try(source: &str, node: Node<'_>) -> Stmt {
    let body = lower_field_block(source, node, "body", false);

    let mut handlers = Vec::new();
    let mut else_body = Vec::new();
    let mut final_body = Vec::new();

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "except_clause" | "except_group_clause" => {
                let mut label = String::from("except");
                let mut handler_body = Vec::new();
                let mut inner = child.walk();
                for part in child.named_children(&mut inner) {
                    match part.kind() {
                        "block" => handler_body = lower_block(source, part, false),
                        "comment" => {}
                        _ => {
                            label = format!("except {}", label_text(source, part));
                        }
                    }
                }
                handlers.push(ExceptHandler {
                    label,
                    body: handler_body,
                });
            }
            "else_clause" => else_body = lower_field_block(source, child, "body", false),
            "finally_clause" => {
                let mut inner = child.walk();
                let block = child
                    .named_children(&mut inner)
                    .find(|part| part.kind() == "block");
                if let Some(block) = block {
                    final_body = lower_block(source, block, false);
                }
            }
            _ => {}
        }
    }

    Stmt::Try {
        body,
        handlers,
        else_body,
        final_body,
    }
}

fn lower_loop_else_into(source: &str, node: Node<'_>, out: &mut Vec<Stmt>) {
    if let Some(alt) = node.child_by_field_name("alternative") {
        if alt.kind() == "else_clause" {
            out.extend(lower_field_block(source, alt, "body", false));
        }
    }
}

fn is_bare_string(node: Node<'_>) -> bool {
    if node.kind() != "expression_statement" {
        return false;
    }
    node.named_children(&mut node.walk())
        .find(|child| child.kind() != "comment")
        .is_some_and(|inner| matches!(inner.kind(), "string" | "concatenated_string"))
}

fn is_io_call(source: &str, call: Node<'_>) -> bool {
    call.child_by_field_name("function")
        .filter(|function| function.kind() == "identifier")
        .map(|function| raw_text(source, function))
        .is_some_and(|name| name == "print" || name == "input")
}

/// True when any call in the subtree reads stdin, e.g. `x = int(input())`.
fn subtree_reads_input(source: &str, node: Node<'_>) -> bool {
    if node.kind() == "call"
        && node
            .child_by_field_name("function")
            .filter(|function| function.kind() == "identifier")
            .map(|function| raw_text(source, function))
            .is_some_and(|name| name == "input")
    {
        return true;
    }
    let mut cursor = node.walk();
    let reads = node
        .named_children(&mut cursor)
        .any(|child| subtree_reads_input(source, child));
    reads
}

fn raw_text<'a>(source: &'a str, node: Node<'_>) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

fn field_text(source: &str, node: Node<'_>, field: &str) -> String {
    match node.child_by_field_name(field) {
        Some(child) => label_text(source, child),
        None => String::new(),
    }
}

fn first_expression_text(source: &str, node: Node<'_>) -> Option<String> {
    node.named_children(&mut node.walk())
        .find(|child| child.kind() != "comment")
        .map(|child| label_text(source, child))
}

/// Display text for a node: whitespace runs collapsed to single spaces and
/// double quotes swapped for single ones, so labels survive the wire format.
fn label_text(source: &str, node: Node<'_>) -> String {
    collapse_label(raw_text(source, node))
}

/// Caller-supplied text (diagram titles) goes through the same collapse as
/// statement labels before it may land on a node.
pub(crate) fn sanitize_label(raw: &str) -> String {
    collapse_label(raw)
}

fn unknown_text(source: &str, node: Node<'_>) -> String {
    let raw = raw_text(source, node);
    let first_line = raw.lines().next().unwrap_or_default();
    let mut text = collapse_label(first_line);
    if text.chars().count() > UNKNOWN_TEXT_MAX {
        text = text.chars().take(UNKNOWN_TEXT_MAX).collect();
        text.push('…');
    }
    text
}

fn collapse_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        let ch = if ch == '"' { '\'' } else { ch };
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::{parse_module, Stmt};

    #[test]
    fn while_else_statements_follow_the_loop() {
        let source = "while n:\n    n -= 1\nelse:\n    done = True\n";
        let module = parse_module(source).expect("parse");
        assert_eq!(module.body.len(), 2);
        assert!(matches!(&module.body[0], Stmt::While { .. }));
        assert!(matches!(&module.body[1], Stmt::Step { text } if text == "done = True"));
    }

    #[test]
    fn try_clauses_are_separated() {
        let source = r#"
try:
    risky()
except ValueError as err:
    handle(err)
except:
    fallback()
else:
    celebrate()
finally:
    cleanup()
"#;
        let module = parse_module(source).expect("parse");
        let Stmt::Try {
            body,
            handlers,
            else_body,
            final_body,
        } = &module.body[0]
        else {
            panic!("expected try, got {:?}", module.body[0]);
        };

        assert_eq!(body.len(), 1);
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].label, "except ValueError as err");
        assert_eq!(handlers[1].label, "except");
        assert_eq!(else_body.len(), 1);
        assert_eq!(final_body.len(), 1);
    }

    #[test]
    fn with_statement_keeps_its_binding_text() {
        let source = "with open(path) as fh:\n    data = fh.read()\n";
        let module = parse_module(source).expect("parse");
        let Stmt::With { binding, body } = &module.body[0] else {
            panic!("expected with, got {:?}", module.body[0]);
        };
        assert_eq!(binding, "open(path) as fh");
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn decorated_function_lowers_to_its_definition() {
        let source = "@cache\ndef fib(n):\n    return n\n";
        let module = parse_module(source).expect("parse");
        assert!(matches!(
            &module.body[0],
            Stmt::FunctionDef { name, .. } if name == "fib"
        ));
    }

    #[test]
    fn imports_are_plain_steps() {
        let module = parse_module("import os\nfrom sys import argv\n").expect("parse");
        assert!(matches!(&module.body[0], Stmt::Step { .. }));
        assert!(matches!(&module.body[1], Stmt::Step { .. }));
    }
}
