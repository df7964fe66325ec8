// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cetus — Python source to flowchart (statement AST + typed flow graph + Mermaid).
//!
//! The core is a pure transformation: source text is parsed into a closed
//! statement AST (`ast`), walked into a `FlowGraph` of typed shape nodes
//! (`build`, `model`), and serialized to a Mermaid flowchart subset that
//! round-trips (`format::mermaid`). Rendering backends and any UI live
//! outside this crate; `ops::convert_source` is the one entry point they call.

pub mod ast;
pub mod build;
pub mod format;
pub mod model;
pub mod ops;
pub mod query;
