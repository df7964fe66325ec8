// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Statement-level Python AST.
//!
//! The grammar front-end (tree-sitter) produces a concrete syntax tree;
//! `lower` flattens it into this closed sum type so every later phase can
//! match exhaustively over statement kinds. Expressions are never recursed
//! into: a statement carries at most the display text of its expressions.

use std::fmt;

mod lower;

pub(crate) use lower::sanitize_label;

/// One Python statement, reduced to what control flow needs.
///
/// Label texts are pre-sanitized: whitespace runs collapsed to single spaces
/// and double quotes replaced, so they can pass through the wire format
/// unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Assignment, call, or other single-step statement.
    Step { text: String },
    /// `print(...)` / `input(...)` steps, rendered as input/output shapes.
    IoStep { text: String },
    Return {
        value: Option<String>,
    },
    Raise {
        value: Option<String>,
    },
    Break,
    Continue,
    Pass,
    FunctionDef {
        name: String,
        body: Vec<Stmt>,
    },
    If {
        test: String,
        then_body: Vec<Stmt>,
        /// An `elif` arrives here as a single nested `If`.
        else_body: Vec<Stmt>,
    },
    While {
        test: String,
        body: Vec<Stmt>,
    },
    For {
        target: String,
        iter: String,
        body: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        else_body: Vec<Stmt>,
        final_body: Vec<Stmt>,
    },
    With {
        binding: String,
        body: Vec<Stmt>,
    },
    /// Grammar constructs the builder has no flowchart mapping for.
    /// These degrade to generic process nodes plus a warning.
    Unknown {
        construct: String,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptHandler {
    pub label: String,
    pub body: Vec<Stmt>,
}

/// A parsed module body, docstrings already stripped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    /// The single function a module defines, if the module is nothing but
    /// that definition. Such sources get a function-labeled start node
    /// instead of a script-labeled one.
    pub fn sole_function(&self) -> Option<(&str, &[Stmt])> {
        match self.body.as_slice() {
            [Stmt::FunctionDef { name, body }] => Some((name.as_str(), body.as_slice())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The grammar failed to load; a build/link problem, not a user error.
    Grammar { message: String },
    /// The parser produced no tree at all.
    Unparseable,
    /// The source is not syntactically valid Python (1-based line/column).
    Syntax { line: usize, column: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grammar { message } => write!(f, "python grammar unavailable: {message}"),
            Self::Unparseable => f.write_str("parser produced no syntax tree"),
            Self::Syntax { line, column } => {
                write!(f, "invalid python syntax at line {line}, column {column}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse UTF-8 Python source into a statement-level module AST.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    lower::lower_source(source)
}
