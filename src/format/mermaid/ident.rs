// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MermaidIdentError {
    Empty,
    ContainsWhitespace,
    InvalidChar { ch: char },
}

impl fmt::Display for MermaidIdentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("must not be empty"),
            Self::ContainsWhitespace => f.write_str("must not contain whitespace"),
            Self::InvalidChar { ch } => write!(f, "contains invalid character: '{ch}'"),
        }
    }
}

pub(super) fn is_mermaid_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub(super) fn validate_mermaid_ident(ident: &str) -> Result<(), MermaidIdentError> {
    if ident.is_empty() {
        return Err(MermaidIdentError::Empty);
    }
    if ident.chars().any(char::is_whitespace) {
        return Err(MermaidIdentError::ContainsWhitespace);
    }
    if let Some(ch) = ident.chars().find(|ch| !is_mermaid_ident_char(*ch)) {
        return Err(MermaidIdentError::InvalidChar { ch });
    }
    Ok(())
}
