// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, NodeId};

/// Shape class of a flowchart node.
///
/// `Loop` renders as a decision diamond but is kept distinct so loop headers
/// survive the wire format and back-edge queries stay cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Start,
    End,
    Process,
    Decision,
    Loop,
    InputOutput,
}

impl NodeKind {
    /// Prefix used when deriving human-readable node IDs (`p1`, `d2`, ...).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Process => "p",
            Self::Decision => "d",
            Self::Loop => "l",
            Self::InputOutput => "io",
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Start | Self::End)
    }

    /// Decision-shaped kinds carry exactly two outgoing edge slots (yes/no).
    pub fn is_branching(&self) -> bool {
        matches!(self, Self::Decision | Self::Loop)
    }
}

/// Label on a control-flow edge. Sequential flow is unlabeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeLabel {
    Yes,
    No,
    LoopBack,
}

impl EdgeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::LoopBack => "loop back",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "loop back" => Some(Self::LoopBack),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    kind: NodeKind,
    label: String,
}

impl FlowNode {
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    from_node_id: NodeId,
    to_node_id: NodeId,
    label: Option<EdgeLabel>,
}

impl FlowEdge {
    pub fn new(from_node_id: NodeId, to_node_id: NodeId) -> Self {
        Self {
            from_node_id,
            to_node_id,
            label: None,
        }
    }

    pub fn new_with(from_node_id: NodeId, to_node_id: NodeId, label: Option<EdgeLabel>) -> Self {
        Self {
            from_node_id,
            to_node_id,
            label,
        }
    }

    pub fn from_node_id(&self) -> &NodeId {
        &self.from_node_id
    }

    pub fn to_node_id(&self) -> &NodeId {
        &self.to_node_id
    }

    pub fn label(&self) -> Option<EdgeLabel> {
        self.label
    }

    pub fn set_label(&mut self, label: Option<EdgeLabel>) {
        self.label = label;
    }
}

/// Errors raised when assembling a graph from loose parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowGraphError {
    MissingStart,
    MissingEnd,
    DuplicateStart { node_id: NodeId },
    DuplicateEnd { node_id: NodeId },
}

impl fmt::Display for FlowGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart => f.write_str("graph has no start node"),
            Self::MissingEnd => f.write_str("graph has no end node"),
            Self::DuplicateStart { node_id } => {
                write!(f, "graph has more than one start node: {node_id}")
            }
            Self::DuplicateEnd { node_id } => {
                write!(f, "graph has more than one end node: {node_id}")
            }
        }
    }
}

impl std::error::Error for FlowGraphError {}

/// The full flowchart for one function or script.
///
/// Owns all nodes and edges; nothing is shared across graphs. Exactly one
/// `Start` and exactly one `End` node exist for the graph's whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowGraph {
    nodes: BTreeMap<NodeId, FlowNode>,
    edges: BTreeMap<EdgeId, FlowEdge>,
    start_node_id: NodeId,
    end_node_id: NodeId,
}

impl FlowGraph {
    /// Create a graph holding only its two terminator nodes.
    pub fn with_terminators(
        start_label: impl Into<String>,
        end_label: impl Into<String>,
    ) -> Self {
        let start_node_id = NodeId::new(NodeKind::Start.id_prefix()).expect("valid node id");
        let end_node_id = NodeId::new(NodeKind::End.id_prefix()).expect("valid node id");

        let mut nodes = BTreeMap::new();
        nodes.insert(
            start_node_id.clone(),
            FlowNode::new(NodeKind::Start, start_label),
        );
        nodes.insert(end_node_id.clone(), FlowNode::new(NodeKind::End, end_label));

        Self {
            nodes,
            edges: BTreeMap::new(),
            start_node_id,
            end_node_id,
        }
    }

    /// Assemble a graph from already-collected parts, verifying the
    /// single-start/single-end shape. Used by the wire-format parser.
    pub fn from_parts(
        nodes: BTreeMap<NodeId, FlowNode>,
        edges: BTreeMap<EdgeId, FlowEdge>,
    ) -> Result<Self, FlowGraphError> {
        let mut start_node_id: Option<NodeId> = None;
        let mut end_node_id: Option<NodeId> = None;

        for (node_id, node) in &nodes {
            match node.kind() {
                NodeKind::Start => {
                    if start_node_id.is_some() {
                        return Err(FlowGraphError::DuplicateStart {
                            node_id: node_id.clone(),
                        });
                    }
                    start_node_id = Some(node_id.clone());
                }
                NodeKind::End => {
                    if end_node_id.is_some() {
                        return Err(FlowGraphError::DuplicateEnd {
                            node_id: node_id.clone(),
                        });
                    }
                    end_node_id = Some(node_id.clone());
                }
                _ => {}
            }
        }

        let start_node_id = start_node_id.ok_or(FlowGraphError::MissingStart)?;
        let end_node_id = end_node_id.ok_or(FlowGraphError::MissingEnd)?;

        Ok(Self {
            nodes,
            edges,
            start_node_id,
            end_node_id,
        })
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, FlowNode> {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut BTreeMap<NodeId, FlowNode> {
        &mut self.nodes
    }

    pub fn edges(&self) -> &BTreeMap<EdgeId, FlowEdge> {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut BTreeMap<EdgeId, FlowEdge> {
        &mut self.edges
    }

    pub fn start_node_id(&self) -> &NodeId {
        &self.start_node_id
    }

    pub fn end_node_id(&self) -> &NodeId {
        &self.end_node_id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{EdgeLabel, FlowGraph, FlowGraphError, FlowNode, NodeKind};
    use crate::model::NodeId;

    #[test]
    fn with_terminators_creates_start_and_end() {
        let graph = FlowGraph::with_terminators("f", "end");
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.start_node_id().as_str(), "start");
        assert_eq!(graph.end_node_id().as_str(), "end");

        let start = graph.nodes().get(graph.start_node_id()).expect("start");
        assert_eq!(start.kind(), NodeKind::Start);
        assert_eq!(start.label(), "f");
    }

    #[test]
    fn from_parts_requires_exactly_one_start_and_end() {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            NodeId::new("start").expect("id"),
            FlowNode::new(NodeKind::Start, "f"),
        );
        let err = FlowGraph::from_parts(nodes.clone(), BTreeMap::new()).unwrap_err();
        assert_eq!(err, FlowGraphError::MissingEnd);

        nodes.insert(
            NodeId::new("end").expect("id"),
            FlowNode::new(NodeKind::End, "end"),
        );
        assert!(FlowGraph::from_parts(nodes.clone(), BTreeMap::new()).is_ok());

        nodes.insert(
            NodeId::new("start2").expect("id"),
            FlowNode::new(NodeKind::Start, "g"),
        );
        let err = FlowGraph::from_parts(nodes, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, FlowGraphError::DuplicateStart { .. }));
    }

    #[test]
    fn edge_labels_round_trip_through_display() {
        for label in [EdgeLabel::Yes, EdgeLabel::No, EdgeLabel::LoopBack] {
            assert_eq!(EdgeLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(EdgeLabel::parse("maybe"), None);
    }

    #[test]
    fn node_kind_id_prefixes_are_mermaid_safe() {
        for kind in [
            NodeKind::Start,
            NodeKind::End,
            NodeKind::Process,
            NodeKind::Decision,
            NodeKind::Loop,
            NodeKind::InputOutput,
        ] {
            assert!(kind
                .id_prefix()
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_'));
        }
    }
}
