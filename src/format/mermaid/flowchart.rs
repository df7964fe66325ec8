// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use super::ident::{is_mermaid_ident_char, validate_mermaid_ident};
pub use super::ident::MermaidIdentError;

use crate::model::{
    EdgeId, EdgeLabel, FlowEdge, FlowGraph, FlowGraphError, FlowNode, NodeId, NodeKind,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MermaidFlowchartParseError {
    MissingHeader,
    InvalidDirection {
        line_no: usize,
        direction: String,
    },
    UnsupportedSyntax {
        line_no: usize,
        line: String,
    },
    InvalidNodeId {
        line_no: usize,
        name: String,
        reason: MermaidIdentError,
    },
    InvalidNodeLabelSyntax {
        line_no: usize,
        token: String,
    },
    EmptyNodeLabel {
        line_no: usize,
        token: String,
    },
    EmptyEdgeLabel {
        line_no: usize,
        line: String,
    },
    UnknownEdgeLabel {
        line_no: usize,
        label: String,
    },
    UnknownTerminator {
        line_no: usize,
        name: String,
    },
    UnknownNode {
        line_no: usize,
        name: String,
    },
    ConflictingNodeLabel {
        line_no: usize,
        mermaid_id: String,
        existing_label: String,
        new_label: String,
    },
    ConflictingNodeKind {
        line_no: usize,
        mermaid_id: String,
        existing_kind: NodeKind,
        new_kind: NodeKind,
    },
    Structure {
        error: FlowGraphError,
    },
}

impl fmt::Display for MermaidFlowchartParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => f.write_str("expected 'flowchart' as the first non-empty line"),
            Self::InvalidDirection { line_no, direction } => write!(
                f,
                "invalid flowchart direction on line {line_no}: {direction} (expected TD/TB/LR/RL/BT)"
            ),
            Self::UnsupportedSyntax { line_no, line } => {
                write!(f, "unsupported Mermaid syntax on line {line_no}: {line}")
            }
            Self::InvalidNodeId {
                line_no,
                name,
                reason,
            } => write!(f, "invalid node id on line {line_no}: {name} ({reason})"),
            Self::InvalidNodeLabelSyntax { line_no, token } => write!(
                f,
                "invalid node label syntax on line {line_no}: {token} (expected '<id>[\"<label>\"]', '<id>([\"<label>\"])', '<id>{{\"<label>\"}}', or '<id>[/\"<label>\"/]')"
            ),
            Self::EmptyNodeLabel { line_no, token } => {
                write!(f, "empty node label on line {line_no}: {token}")
            }
            Self::EmptyEdgeLabel { line_no, line } => {
                write!(f, "empty edge label on line {line_no}: {line}")
            }
            Self::UnknownEdgeLabel { line_no, label } => write!(
                f,
                "unknown edge label on line {line_no}: {label:?} (expected 'yes', 'no', or 'loop back')"
            ),
            Self::UnknownTerminator { line_no, name } => write!(
                f,
                "unknown terminator id on line {line_no}: {name} (stadium nodes must be 'start' or 'end')"
            ),
            Self::UnknownNode { line_no, name } => {
                write!(f, "edge on line {line_no} references undeclared node: {name}")
            }
            Self::ConflictingNodeLabel {
                line_no,
                mermaid_id,
                existing_label,
                new_label,
            } => write!(
                f,
                "conflicting label for node '{mermaid_id}' on line {line_no}: '{existing_label}' vs '{new_label}'"
            ),
            Self::ConflictingNodeKind {
                line_no,
                mermaid_id,
                existing_kind,
                new_kind,
            } => write!(
                f,
                "conflicting shape for node '{mermaid_id}' on line {line_no}: {existing_kind:?} vs {new_kind:?}"
            ),
            Self::Structure { error } => write!(f, "invalid flowchart structure: {error}"),
        }
    }
}

impl std::error::Error for MermaidFlowchartParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MermaidFlowchartExportError {
    MissingNode {
        node_id: NodeId,
    },
    InvalidNodeId {
        node_id: NodeId,
        reason: MermaidIdentError,
    },
    InvalidNodeLabel {
        node_id: NodeId,
        label: String,
    },
    InvalidTitle {
        title: String,
    },
}

impl fmt::Display for MermaidFlowchartExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode { node_id } => {
                write!(f, "edge references missing node id: {node_id}")
            }
            Self::InvalidNodeId { node_id, reason } => {
                write!(f, "cannot export node id as Mermaid identifier: {node_id} ({reason})")
            }
            Self::InvalidNodeLabel { node_id, label } => write!(
                f,
                "cannot export node label for {node_id}: contains unsupported characters: {label:?}"
            ),
            Self::InvalidTitle { title } => {
                write!(f, "cannot export title: contains line breaks: {title:?}")
            }
        }
    }
}

impl std::error::Error for MermaidFlowchartExportError {}

/// The four delimiter pairs the wire format uses. Node kind maps onto shape
/// on export; shape plus the node id recovers the kind on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeShape {
    Stadium,
    Rect,
    Diamond,
    Parallelogram,
}

impl NodeShape {
    fn for_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Start | NodeKind::End => Self::Stadium,
            NodeKind::Process => Self::Rect,
            NodeKind::Decision | NodeKind::Loop => Self::Diamond,
            NodeKind::InputOutput => Self::Parallelogram,
        }
    }

    fn delimiters(&self) -> (&'static str, &'static str) {
        match self {
            Self::Stadium => ("([", "])"),
            Self::Rect => ("[", "]"),
            Self::Diamond => ("{", "}"),
            Self::Parallelogram => ("[/", "/]"),
        }
    }
}

/// Loop headers and decisions share the diamond shape; the id prefix keeps
/// them apart (`l<N>` versus everything else).
fn is_loop_ident(ident: &str) -> bool {
    ident
        .strip_prefix('l')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
}

fn kind_for_shape(
    shape: NodeShape,
    ident: &str,
    line_no: usize,
) -> Result<NodeKind, MermaidFlowchartParseError> {
    match shape {
        NodeShape::Stadium => match ident {
            "start" => Ok(NodeKind::Start),
            "end" => Ok(NodeKind::End),
            _ => Err(MermaidFlowchartParseError::UnknownTerminator {
                line_no,
                name: ident.to_owned(),
            }),
        },
        NodeShape::Rect => Ok(NodeKind::Process),
        NodeShape::Parallelogram => Ok(NodeKind::InputOutput),
        NodeShape::Diamond => {
            if is_loop_ident(ident) {
                Ok(NodeKind::Loop)
            } else {
                Ok(NodeKind::Decision)
            }
        }
    }
}

fn edge_id_from_index(index: usize) -> EdgeId {
    EdgeId::new(format!("e:{index:04}")).expect("valid edge id")
}

/// `<lhs> --> <rhs>`, honoring quoted labels so an arrow inside a label is
/// not mistaken for the edge operator.
fn split_arrow(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    let mut in_quote = false;
    for idx in 0..bytes.len() {
        match bytes[idx] {
            b'"' => in_quote = !in_quote,
            b'-' if !in_quote && line[idx..].starts_with("-->") => {
                return Some((&line[..idx], &line[idx + 3..]));
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSpec {
    mermaid_id: String,
    decl: Option<(NodeShape, String)>,
}

fn parse_node_spec(token: &str, line_no: usize) -> Result<NodeSpec, MermaidFlowchartParseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(MermaidFlowchartParseError::UnsupportedSyntax {
            line_no,
            line: token.to_owned(),
        });
    }

    let ident_end = trimmed
        .char_indices()
        .find(|(_, ch)| !is_mermaid_ident_char(*ch))
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    let ident = &trimmed[..ident_end];
    validate_mermaid_ident(ident).map_err(|reason| MermaidFlowchartParseError::InvalidNodeId {
        line_no,
        name: ident.to_owned(),
        reason,
    })?;

    let rest = &trimmed[ident_end..];
    if rest.is_empty() {
        return Ok(NodeSpec {
            mermaid_id: ident.to_owned(),
            decl: None,
        });
    }

    // Longest delimiters first so `([`/`[/` win over plain `[`.
    let shapes = [
        NodeShape::Stadium,
        NodeShape::Parallelogram,
        NodeShape::Rect,
        NodeShape::Diamond,
    ];
    let Some((shape, inner)) = shapes.iter().find_map(|shape| {
        let (open, close) = shape.delimiters();
        rest.strip_prefix(open)
            .and_then(|inner| inner.strip_suffix(close))
            .map(|inner| (*shape, inner))
    }) else {
        return Err(MermaidFlowchartParseError::InvalidNodeLabelSyntax {
            line_no,
            token: trimmed.to_owned(),
        });
    };

    let label = inner.trim();
    let label = label
        .strip_prefix('"')
        .and_then(|label| label.strip_suffix('"'))
        .unwrap_or(label);
    if label.is_empty() {
        return Err(MermaidFlowchartParseError::EmptyNodeLabel {
            line_no,
            token: trimmed.to_owned(),
        });
    }

    Ok(NodeSpec {
        mermaid_id: ident.to_owned(),
        decl: Some((shape, label.to_owned())),
    })
}

/// Register a spec in the node map, rejecting contradictory re-declarations.
/// Bare references resolve only against already-declared nodes.
fn ensure_node(
    nodes: &mut BTreeMap<NodeId, FlowNode>,
    spec: NodeSpec,
    line_no: usize,
) -> Result<NodeId, MermaidFlowchartParseError> {
    let NodeSpec { mermaid_id, decl } = spec;
    let node_id =
        NodeId::new(mermaid_id.as_str()).map_err(|_| MermaidFlowchartParseError::InvalidNodeId {
            line_no,
            name: mermaid_id.clone(),
            reason: MermaidIdentError::Empty,
        })?;

    let Some((shape, label)) = decl else {
        if !nodes.contains_key(&node_id) {
            return Err(MermaidFlowchartParseError::UnknownNode {
                line_no,
                name: mermaid_id,
            });
        }
        return Ok(node_id);
    };

    let kind = kind_for_shape(shape, &mermaid_id, line_no)?;
    match nodes.get(&node_id) {
        None => {
            nodes.insert(node_id.clone(), FlowNode::new(kind, label));
        }
        Some(existing) => {
            if existing.kind() != kind {
                return Err(MermaidFlowchartParseError::ConflictingNodeKind {
                    line_no,
                    mermaid_id,
                    existing_kind: existing.kind(),
                    new_kind: kind,
                });
            }
            if existing.label() != label {
                return Err(MermaidFlowchartParseError::ConflictingNodeLabel {
                    line_no,
                    mermaid_id,
                    existing_label: existing.label().to_owned(),
                    new_label: label,
                });
            }
        }
    }

    Ok(node_id)
}

/// Parse the canonical Mermaid `flowchart` subset back into a graph.
///
/// Supported:
/// - `flowchart`/`graph` header with optional direction (`TD`, `TB`, `LR`, `RL`, `BT`)
/// - comment lines starting with `%%` (the exported title comment among them)
/// - node declarations in the four wire shapes, labels optionally quoted
/// - edges `<lhs> --> <rhs>` with an optional `|label|` from the closed
///   label set (`yes`, `no`, `loop back`)
///
/// Anything else is rejected with a line-numbered error. The reassembled
/// graph re-checks the single-start/single-end shape.
pub fn parse_flowchart(input: &str) -> Result<FlowGraph, MermaidFlowchartParseError> {
    let mut nodes = BTreeMap::<NodeId, FlowNode>::new();
    let mut edges = BTreeMap::<EdgeId, FlowEdge>::new();
    let mut saw_header = false;
    let mut edge_index = 0usize;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }

        if !saw_header {
            let mut parts = trimmed.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            if keyword != "flowchart" && keyword != "graph" {
                return Err(MermaidFlowchartParseError::MissingHeader);
            }
            if let Some(direction) = parts.next() {
                match direction {
                    "TD" | "TB" | "LR" | "RL" | "BT" => {}
                    _ => {
                        return Err(MermaidFlowchartParseError::InvalidDirection {
                            line_no,
                            direction: direction.to_owned(),
                        });
                    }
                }
            }
            if parts.next().is_some() {
                return Err(MermaidFlowchartParseError::UnsupportedSyntax {
                    line_no,
                    line: trimmed.to_owned(),
                });
            }
            saw_header = true;
            continue;
        }

        let Some((lhs_raw, rest)) = split_arrow(trimmed) else {
            // Plain node declaration.
            let spec = parse_node_spec(trimmed, line_no)?;
            if spec.decl.is_none() {
                return Err(MermaidFlowchartParseError::UnsupportedSyntax {
                    line_no,
                    line: trimmed.to_owned(),
                });
            }
            ensure_node(&mut nodes, spec, line_no)?;
            continue;
        };

        let rest = rest.trim_start();
        let (label, rhs_raw) = match rest.strip_prefix('|') {
            Some(after) => {
                let Some(end_idx) = after.find('|') else {
                    return Err(MermaidFlowchartParseError::UnsupportedSyntax {
                        line_no,
                        line: trimmed.to_owned(),
                    });
                };
                let label_raw = after[..end_idx].trim();
                if label_raw.is_empty() {
                    return Err(MermaidFlowchartParseError::EmptyEdgeLabel {
                        line_no,
                        line: trimmed.to_owned(),
                    });
                }
                let label = EdgeLabel::parse(label_raw).ok_or_else(|| {
                    MermaidFlowchartParseError::UnknownEdgeLabel {
                        line_no,
                        label: label_raw.to_owned(),
                    }
                })?;
                (Some(label), &after[end_idx + 1..])
            }
            None => (None, rest),
        };

        if split_arrow(rhs_raw).is_some() {
            // Edge chains are not part of the canonical format.
            return Err(MermaidFlowchartParseError::UnsupportedSyntax {
                line_no,
                line: trimmed.to_owned(),
            });
        }

        let from_spec = parse_node_spec(lhs_raw, line_no)?;
        let to_spec = parse_node_spec(rhs_raw, line_no)?;
        let from_node_id = ensure_node(&mut nodes, from_spec, line_no)?;
        let to_node_id = ensure_node(&mut nodes, to_spec, line_no)?;

        edge_index += 1;
        edges.insert(
            edge_id_from_index(edge_index),
            FlowEdge::new_with(from_node_id, to_node_id, label),
        );
    }

    if !saw_header {
        return Err(MermaidFlowchartParseError::MissingHeader);
    }

    FlowGraph::from_parts(nodes, edges)
        .map_err(|error| MermaidFlowchartParseError::Structure { error })
}

fn validate_export_label(label: &str) -> bool {
    !label.contains('"') && !label.contains('\n') && !label.contains('\r')
}

/// Export a graph to canonical Mermaid.
///
/// Export is stable/deterministic:
/// - `flowchart TD` header, then the title comment when a title is given.
/// - Nodes are emitted in `NodeId` order.
/// - Edges are emitted sorted by `(from_node_id, to_node_id, edge_id)`.
pub fn export_flowchart(
    graph: &FlowGraph,
    title: Option<&str>,
) -> Result<String, MermaidFlowchartExportError> {
    let mut out = String::new();
    out.push_str("flowchart TD\n");
    if let Some(title) = title {
        if title.contains('\n') || title.contains('\r') {
            return Err(MermaidFlowchartExportError::InvalidTitle {
                title: title.to_owned(),
            });
        }
        out.push_str("%% title: ");
        out.push_str(title);
        out.push('\n');
    }

    for (node_id, node) in graph.nodes() {
        validate_mermaid_ident(node_id.as_str()).map_err(|reason| {
            MermaidFlowchartExportError::InvalidNodeId {
                node_id: node_id.clone(),
                reason,
            }
        })?;
        if !validate_export_label(node.label()) {
            return Err(MermaidFlowchartExportError::InvalidNodeLabel {
                node_id: node_id.clone(),
                label: node.label().to_owned(),
            });
        }

        let (open, close) = NodeShape::for_kind(node.kind()).delimiters();
        out.push_str("    ");
        out.push_str(node_id.as_str());
        out.push_str(open);
        out.push('"');
        out.push_str(node.label());
        out.push('"');
        out.push_str(close);
        out.push('\n');
    }

    let mut edges = graph.edges().iter().collect::<Vec<_>>();
    edges.sort_by(|(edge_id_a, edge_a), (edge_id_b, edge_b)| {
        edge_a
            .from_node_id()
            .cmp(edge_b.from_node_id())
            .then_with(|| edge_a.to_node_id().cmp(edge_b.to_node_id()))
            .then_with(|| edge_id_a.cmp(edge_id_b))
    });

    for (_, edge) in edges {
        for node_id in [edge.from_node_id(), edge.to_node_id()] {
            if !graph.nodes().contains_key(node_id) {
                return Err(MermaidFlowchartExportError::MissingNode {
                    node_id: node_id.clone(),
                });
            }
        }

        out.push_str("    ");
        out.push_str(edge.from_node_id().as_str());
        out.push_str(" -->");
        if let Some(label) = edge.label() {
            out.push('|');
            out.push_str(label.as_str());
            out.push('|');
        }
        out.push(' ');
        out.push_str(edge.to_node_id().as_str());
        out.push('\n');
    }

    Ok(out)
}
