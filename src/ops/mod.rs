// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end conversion: Python source in, flow graph and Mermaid out.

use std::fmt;

use crate::ast::{self, ParseError};
use crate::build::{self, BuildWarning};
use crate::format::mermaid::{self, MermaidFlowchartExportError};
use crate::model::FlowGraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    Parse(ParseError),
    Emission(MermaidFlowchartExportError),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(error) => write!(f, "cannot parse source: {error}"),
            Self::Emission(error) => write!(f, "cannot emit flowchart: {error}"),
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<ParseError> for ConvertError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<MermaidFlowchartExportError> for ConvertError {
    fn from(error: MermaidFlowchartExportError) -> Self {
        Self::Emission(error)
    }
}

/// A completed conversion: the graph, its Mermaid rendering, and any
/// warnings collected while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    graph: FlowGraph,
    mermaid: String,
    warnings: Vec<BuildWarning>,
}

impl Conversion {
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn mermaid(&self) -> &str {
        &self.mermaid
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }
}

/// Convert one Python module to a flowchart.
///
/// `title` labels the start node (and the exported title comment) when the
/// source is a script; a module that is a single function definition uses
/// the function name instead.
pub fn convert_source(source: &str, title: Option<&str>) -> Result<Conversion, ConvertError> {
    // Collapse the title up front so quotes or line breaks in caller input
    // cannot fail the export later.
    let title = title
        .map(ast::sanitize_label)
        .filter(|title| !title.is_empty());
    let module = ast::parse_module(source)?;
    let (graph, warnings) = build::build_flowchart(&module, title.as_deref()).into_parts();
    let mermaid = mermaid::export_flowchart(&graph, title.as_deref())?;
    Ok(Conversion {
        graph,
        mermaid,
        warnings,
    })
}
