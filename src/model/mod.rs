// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: typed node/edge IDs and the flow graph.

pub mod graph;
pub mod ids;

pub use graph::{EdgeLabel, FlowEdge, FlowGraph, FlowGraphError, FlowNode, NodeKind};
pub use ids::{EdgeId, Id, IdError, NodeId};
