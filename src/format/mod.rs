// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram format parsing/export.
//!
//! The wire format is a canonical Mermaid `flowchart` subset; node shapes
//! carry the node kind so a parsed chart reconstructs the full graph.

pub mod mermaid;
