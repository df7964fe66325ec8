// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid flowchart parsing and exporting.

pub mod flowchart;
mod ident;

pub use flowchart::{
    export_flowchart, parse_flowchart, MermaidFlowchartExportError, MermaidFlowchartParseError,
};
pub use ident::MermaidIdentError;
