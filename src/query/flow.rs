// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::model::{FlowGraph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowNodeDegree {
    pub in_degree: u64,
    pub out_degree: u64,
}

pub fn degrees(graph: &FlowGraph) -> BTreeMap<NodeId, FlowNodeDegree> {
    let mut degrees: BTreeMap<NodeId, FlowNodeDegree> = BTreeMap::new();
    for node_id in graph.nodes().keys() {
        degrees.entry(node_id.clone()).or_default();
    }

    for edge in graph.edges().values() {
        let from_degree = degrees.entry(edge.from_node_id().clone()).or_default();
        from_degree.out_degree = from_degree.out_degree.saturating_add(1);

        let to_degree = degrees.entry(edge.to_node_id().clone()).or_default();
        to_degree.in_degree = to_degree.in_degree.saturating_add(1);
    }

    degrees
}

fn outgoing_adjacency(graph: &FlowGraph) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut outgoing: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();

    for node_id in graph.nodes().keys() {
        outgoing.entry(node_id.clone()).or_default();
    }

    for edge in graph.edges().values() {
        outgoing
            .entry(edge.from_node_id().clone())
            .or_default()
            .insert(edge.to_node_id().clone());
        outgoing.entry(edge.to_node_id().clone()).or_default();
    }

    outgoing
        .into_iter()
        .map(|(node_id, neighbors)| (node_id, neighbors.into_iter().collect()))
        .collect()
}

/// Forward-reachable node set from `from_node_id`, sorted, start included.
pub fn reachable(graph: &FlowGraph, from_node_id: &NodeId) -> Vec<NodeId> {
    if !graph.nodes().contains_key(from_node_id) {
        return Vec::new();
    }

    let outgoing = outgoing_adjacency(graph);
    let mut visited: BTreeSet<NodeId> = BTreeSet::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    visited.insert(from_node_id.clone());
    queue.push_back(from_node_id.clone());

    while let Some(node_id) = queue.pop_front() {
        for next_id in outgoing.get(&node_id).into_iter().flatten() {
            if visited.insert(next_id.clone()) {
                queue.push_back(next_id.clone());
            }
        }
    }

    visited.into_iter().collect()
}

/// Strongly connected components with at least one cycle, each sorted, the
/// list itself sorted. Loop headers with their back edges show up here.
pub fn cycles(graph: &FlowGraph) -> Vec<Vec<NodeId>> {
    let outgoing = outgoing_adjacency(graph);

    let mut index: usize = 0;
    let mut indices: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut lowlink: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut on_stack: BTreeSet<NodeId> = BTreeSet::new();
    let mut sccs: Vec<Vec<NodeId>> = Vec::new();

    #[allow(clippy::too_many_arguments)]
    fn strongconnect(
        v: NodeId,
        index: &mut usize,
        outgoing: &BTreeMap<NodeId, Vec<NodeId>>,
        indices: &mut BTreeMap<NodeId, usize>,
        lowlink: &mut BTreeMap<NodeId, usize>,
        stack: &mut Vec<NodeId>,
        on_stack: &mut BTreeSet<NodeId>,
        sccs: &mut Vec<Vec<NodeId>>,
    ) {
        indices.insert(v.clone(), *index);
        lowlink.insert(v.clone(), *index);
        *index = index.saturating_add(1);

        stack.push(v.clone());
        on_stack.insert(v.clone());

        for w in outgoing.get(&v).into_iter().flatten() {
            if !indices.contains_key(w) {
                strongconnect(
                    w.clone(),
                    index,
                    outgoing,
                    indices,
                    lowlink,
                    stack,
                    on_stack,
                    sccs,
                );
                let v_low = lowlink.get(&v).copied().unwrap_or(usize::MAX);
                let w_low = lowlink.get(w).copied().unwrap_or(usize::MAX);
                lowlink.insert(v.clone(), v_low.min(w_low));
            } else if on_stack.contains(w) {
                let v_low = lowlink.get(&v).copied().unwrap_or(usize::MAX);
                let w_index = indices.get(w).copied().unwrap_or(usize::MAX);
                lowlink.insert(v.clone(), v_low.min(w_index));
            }
        }

        let v_index = indices.get(&v).copied().unwrap_or(usize::MAX);
        let v_low = lowlink.get(&v).copied().unwrap_or(usize::MAX);
        if v_low == v_index {
            let mut scc: Vec<NodeId> = Vec::new();
            while let Some(w) = stack.pop() {
                on_stack.remove(&w);
                scc.push(w.clone());
                if w == v {
                    break;
                }
            }
            sccs.push(scc);
        }
    }

    for v in outgoing.keys() {
        if indices.contains_key(v) {
            continue;
        }
        strongconnect(
            v.clone(),
            &mut index,
            &outgoing,
            &mut indices,
            &mut lowlink,
            &mut stack,
            &mut on_stack,
            &mut sccs,
        );
    }

    let mut cycles: Vec<Vec<NodeId>> = sccs
        .into_iter()
        .filter_map(|mut scc| {
            scc.sort();
            match scc.as_slice() {
                [] => None,
                [node_id] => outgoing
                    .get(node_id)
                    .into_iter()
                    .flatten()
                    .any(|next_id| next_id == node_id)
                    .then_some(scc),
                _ => Some(scc),
            }
        })
        .collect();

    cycles.sort();
    cycles
}

/// Nodes with no outgoing edges. In a well-formed chart only the end
/// terminator qualifies; anything else is a wiring bug worth surfacing.
pub fn dead_ends(graph: &FlowGraph) -> Vec<NodeId> {
    let outgoing = outgoing_adjacency(graph);
    outgoing
        .into_iter()
        .filter_map(|(node_id, next_ids)| next_ids.is_empty().then_some(node_id))
        .collect()
}
