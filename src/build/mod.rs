// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cetus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cetus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Flow graph construction.
//!
//! A recursive descent over statement lists threads an explicit set of "open
//! edges" (source fixed, destination pending). Each recursive call receives
//! the open edges flowing into its statement list and returns the open edges
//! flowing out; branches that end in `return`/`break`/`continue` return
//! nothing and so are excluded from implicit joins. Node IDs come from a
//! counter owned by the builder, scoped to one build.

use std::fmt;

use serde::Serialize;
use smallvec::{smallvec, SmallVec};

use crate::ast::{sanitize_label, ExceptHandler, Module, Stmt};
use crate::model::{EdgeId, EdgeLabel, FlowEdge, FlowGraph, FlowNode, NodeId, NodeKind};

/// Start label used when the source is a script rather than one function.
const SCRIPT_LABEL: &str = "script";

/// An edge whose source is fixed but whose destination is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenEdge {
    from: NodeId,
    label: Option<EdgeLabel>,
}

impl OpenEdge {
    fn sequential(from: NodeId) -> Self {
        Self { from, label: None }
    }

    fn labeled(from: NodeId, label: EdgeLabel) -> Self {
        Self {
            from,
            label: Some(label),
        }
    }
}

/// Open-edge sets are almost always one or two entries (a node's single
/// outgoing edge, or a decision's yes/no pair).
type OpenEdges = SmallVec<[OpenEdge; 2]>;

/// Non-fatal report about a construct the builder could not map exactly.
/// The build continues; the construct degrades to a generic process node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    construct: String,
    detail: String,
}

impl BuildWarning {
    fn new(construct: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            construct: construct.into(),
            detail: detail.into(),
        }
    }

    pub fn construct(&self) -> &str {
        &self.construct
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.construct, self.detail)
    }
}

/// Result of one build: a well-formed graph plus collected warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowchartBuild {
    graph: FlowGraph,
    warnings: Vec<BuildWarning>,
}

impl FlowchartBuild {
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    pub fn into_parts(self) -> (FlowGraph, Vec<BuildWarning>) {
        (self.graph, self.warnings)
    }
}

/// Build the flowchart for one module.
///
/// A module consisting of a single function definition charts that function
/// with its name on the start node; anything else charts as a script, using
/// `title` (or a generic label) for the start node. The transformation is
/// pure: the same module always yields the identical graph.
pub fn build_flowchart(module: &Module, title: Option<&str>) -> FlowchartBuild {
    let (start_label, body): (String, &[Stmt]) = match module.sole_function() {
        Some((name, body)) => (name.to_owned(), body),
        None => {
            // Titles are caller input; collapse them like statement labels
            // so the start node stays emit-safe.
            let label = title
                .map(sanitize_label)
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| SCRIPT_LABEL.to_owned());
            (label, module.body.as_slice())
        }
    };

    let mut builder = Builder::new(&start_label);
    let entry = OpenEdge::sequential(builder.graph.start_node_id().clone());
    let open = builder.build_body(body, smallvec![entry]);
    let end = builder.graph.end_node_id().clone();
    builder.connect(&open, &end);

    FlowchartBuild {
        graph: builder.graph,
        warnings: builder.warnings,
    }
}

struct LoopFrame {
    header: NodeId,
    breaks: OpenEdges,
}

struct Builder {
    graph: FlowGraph,
    warnings: Vec<BuildWarning>,
    node_seq: usize,
    edge_seq: usize,
    loops: Vec<LoopFrame>,
}

impl Builder {
    fn new(start_label: &str) -> Self {
        Self {
            graph: FlowGraph::with_terminators(start_label, "end"),
            warnings: Vec::new(),
            node_seq: 0,
            edge_seq: 0,
            loops: Vec::new(),
        }
    }

    fn fresh_node(&mut self, kind: NodeKind, label: impl Into<String>) -> NodeId {
        self.node_seq += 1;
        let mut seq = itoa::Buffer::new();
        let mut id = String::with_capacity(kind.id_prefix().len().saturating_add(4));
        id.push_str(kind.id_prefix());
        id.push_str(seq.format(self.node_seq));

        let node_id = NodeId::new(id).expect("valid node id");
        self.graph
            .nodes_mut()
            .insert(node_id.clone(), FlowNode::new(kind, label));
        node_id
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, label: Option<EdgeLabel>) {
        self.edge_seq += 1;
        let edge_id = EdgeId::new(format!("e:{:04}", self.edge_seq)).expect("valid edge id");
        self.graph
            .edges_mut()
            .insert(edge_id, FlowEdge::new_with(from, to, label));
    }

    /// Sink every open edge into `to`, preserving per-edge labels.
    fn connect(&mut self, open: &OpenEdges, to: &NodeId) {
        for edge in open {
            self.add_edge(edge.from.clone(), to.clone(), edge.label);
        }
    }

    fn warn(&mut self, construct: impl Into<String>, detail: impl Into<String>) {
        self.warnings.push(BuildWarning::new(construct, detail));
    }

    fn build_body(&mut self, stmts: &[Stmt], incoming: OpenEdges) -> OpenEdges {
        let mut open = incoming;
        for stmt in stmts {
            if open.is_empty() {
                // The branch already closed via return/break/continue;
                // charting the rest would create unreachable nodes.
                self.warn("unreachable", "statements after an early exit were skipped");
                break;
            }
            open = self.build_stmt(stmt, open);
        }
        open
    }

    fn build_stmt(&mut self, stmt: &Stmt, incoming: OpenEdges) -> OpenEdges {
        match stmt {
            Stmt::Step { text } => self.sequential_node(NodeKind::Process, text, incoming),
            Stmt::IoStep { text } => self.sequential_node(NodeKind::InputOutput, text, incoming),
            Stmt::Pass => incoming,
            Stmt::Return { value } => {
                let label = match value {
                    Some(value) => format!("return {value}"),
                    None => String::from("return"),
                };
                self.exit_node(&label, incoming)
            }
            Stmt::Raise { value } => {
                let label = match value {
                    Some(value) => format!("raise {value}"),
                    None => String::from("raise"),
                };
                self.exit_node(&label, incoming)
            }
            Stmt::Break => self.build_break(incoming),
            Stmt::Continue => self.build_continue(incoming),
            Stmt::If {
                test,
                then_body,
                else_body,
            } => self.build_if(test, then_body, else_body, incoming),
            Stmt::While { test, body } => self.build_loop(test.clone(), body, incoming),
            Stmt::For { target, iter, body } => {
                self.build_loop(format!("{target} in {iter}"), body, incoming)
            }
            Stmt::Try {
                body,
                handlers,
                else_body,
                final_body,
            } => self.build_try(body, handlers, else_body, final_body, incoming),
            Stmt::With { binding, body } => {
                let label = format!("with {binding}");
                let open = self.sequential_node(NodeKind::Process, &label, incoming);
                self.build_body(body, open)
            }
            Stmt::FunctionDef { name, .. } => {
                // A nested definition is a sequential step; its body is a
                // separate callable, not part of this chart's control flow.
                self.sequential_node(NodeKind::Process, &format!("def {name}"), incoming)
            }
            Stmt::Unknown { construct, text } => {
                self.warn(
                    construct.clone(),
                    "no flowchart mapping, rendered as a generic step",
                );
                let label = if text.is_empty() { construct } else { text };
                self.sequential_node(NodeKind::Process, label, incoming)
            }
        }
    }

    /// One node, one outgoing open edge.
    fn sequential_node(&mut self, kind: NodeKind, label: &str, incoming: OpenEdges) -> OpenEdges {
        let node = self.fresh_node(kind, label);
        self.connect(&incoming, &node);
        smallvec![OpenEdge::sequential(node)]
    }

    /// A node wired straight to the end terminator; the branch closes.
    fn exit_node(&mut self, label: &str, incoming: OpenEdges) -> OpenEdges {
        let node = self.fresh_node(NodeKind::Process, label);
        self.connect(&incoming, &node);
        let end = self.graph.end_node_id().clone();
        self.add_edge(node, end, None);
        smallvec![]
    }

    fn build_break(&mut self, incoming: OpenEdges) -> OpenEdges {
        let node = self.fresh_node(NodeKind::Process, "break");
        self.connect(&incoming, &node);
        match self.loops.last_mut() {
            Some(frame) => {
                frame.breaks.push(OpenEdge::sequential(node));
                smallvec![]
            }
            None => {
                self.warn("break", "break outside any loop, treated as a plain step");
                smallvec![OpenEdge::sequential(node)]
            }
        }
    }

    fn build_continue(&mut self, incoming: OpenEdges) -> OpenEdges {
        let node = self.fresh_node(NodeKind::Process, "continue");
        self.connect(&incoming, &node);
        match self.loops.last() {
            Some(frame) => {
                let header = frame.header.clone();
                self.add_edge(node, header, Some(EdgeLabel::LoopBack));
                smallvec![]
            }
            None => {
                self.warn(
                    "continue",
                    "continue outside any loop, treated as a plain step",
                );
                smallvec![OpenEdge::sequential(node)]
            }
        }
    }

    fn build_if(
        &mut self,
        test: &str,
        then_body: &[Stmt],
        else_body: &[Stmt],
        incoming: OpenEdges,
    ) -> OpenEdges {
        let decision = self.fresh_node(NodeKind::Decision, test);
        self.connect(&incoming, &decision);

        let yes_edge: OpenEdges = smallvec![OpenEdge::labeled(decision.clone(), EdgeLabel::Yes)];
        let mut open = self.build_body(then_body, yes_edge);

        let no_edge: OpenEdges = smallvec![OpenEdge::labeled(decision, EdgeLabel::No)];
        if else_body.is_empty() {
            // No else: the "no" edge flows on to whatever comes next.
            open.extend(no_edge);
        } else {
            open.extend(self.build_body(else_body, no_edge));
        }

        // `open` now holds every branch end that did not close early; they
        // all converge on the next downstream node, no merge node needed.
        open
    }

    fn build_loop(&mut self, test: String, body: &[Stmt], incoming: OpenEdges) -> OpenEdges {
        let header = self.fresh_node(NodeKind::Loop, test);
        self.connect(&incoming, &header);

        self.loops.push(LoopFrame {
            header: header.clone(),
            breaks: smallvec![],
        });

        let yes_edge: OpenEdges = smallvec![OpenEdge::labeled(header.clone(), EdgeLabel::Yes)];
        let body_open = self.build_body(body, yes_edge);

        // Whatever is still open at the end of the body loops back to the
        // header; unlabeled ends get the explicit back-edge label.
        for edge in body_open {
            let label = edge.label.unwrap_or(EdgeLabel::LoopBack);
            self.add_edge(edge.from, header.clone(), Some(label));
        }

        let frame = self.loops.pop().expect("loop frame pushed above");
        let mut open: OpenEdges = smallvec![OpenEdge::labeled(header, EdgeLabel::No)];
        open.extend(frame.breaks);
        open
    }

    /// `try` charts as a decision chain: the happy path leaves via "yes",
    /// each handler is a further decision on the failure path, an unmatched
    /// exception propagates to the end terminator. The `finally` body, when
    /// present, collects every surviving branch end.
    fn build_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        else_body: &[Stmt],
        final_body: &[Stmt],
        incoming: OpenEdges,
    ) -> OpenEdges {
        let head = self.fresh_node(NodeKind::Decision, "try");
        self.connect(&incoming, &head);

        let mut open =
            self.build_body(body, smallvec![OpenEdge::labeled(head.clone(), EdgeLabel::Yes)]);
        if !else_body.is_empty() {
            open = self.build_body(else_body, open);
        }

        let mut failing: OpenEdges = smallvec![OpenEdge::labeled(head, EdgeLabel::No)];
        for handler in handlers {
            let handler_head = self.fresh_node(NodeKind::Decision, &handler.label);
            self.connect(&failing, &handler_head);
            open.extend(self.build_body(
                &handler.body,
                smallvec![OpenEdge::labeled(handler_head.clone(), EdgeLabel::Yes)],
            ));
            failing = smallvec![OpenEdge::labeled(handler_head, EdgeLabel::No)];
        }

        // No handler matched (or none exist): the exception leaves the chart.
        let end = self.graph.end_node_id().clone();
        if final_body.is_empty() {
            self.connect(&failing, &end);
            return open;
        }

        if open.is_empty() {
            // Every try/handler path closed early, but the finally body
            // still runs; chart it on the unmatched-exception path.
            let finally_open = self.build_body(final_body, failing);
            self.connect(&finally_open, &end);
            smallvec![]
        } else {
            self.connect(&failing, &end);
            self.build_body(final_body, open)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_flowchart, FlowchartBuild};
    use crate::ast::parse_module;
    use crate::model::{EdgeLabel, NodeId, NodeKind};
    use crate::query;

    fn build(source: &str) -> FlowchartBuild {
        let module = parse_module(source).expect("parse");
        build_flowchart(&module, None)
    }

    fn node_id_by_label(build: &FlowchartBuild, label: &str) -> NodeId {
        build
            .graph()
            .nodes()
            .iter()
            .find(|(_, node)| node.label() == label)
            .map(|(node_id, _)| node_id.clone())
            .unwrap_or_else(|| panic!("no node labeled {label:?}"))
    }

    fn edge_exists(build: &FlowchartBuild, from: &str, to: &str, label: Option<EdgeLabel>) -> bool {
        build.graph().edges().values().any(|edge| {
            edge.from_node_id().as_str() == from
                && edge.to_node_id().as_str() == to
                && edge.label() == label
        })
    }

    #[test]
    fn empty_function_is_start_to_end() {
        let build = build("def h():\n    pass\n");
        assert_eq!(build.graph().nodes().len(), 2);
        assert_eq!(build.graph().edges().len(), 1);
        assert!(edge_exists(&build, "start", "end", None));
        assert!(build.warnings().is_empty());

        let start = build
            .graph()
            .nodes()
            .get(build.graph().start_node_id())
            .expect("start");
        assert_eq!(start.label(), "h");
    }

    #[test]
    fn returning_branches_meet_at_the_single_end() {
        let source = r#"
def f(x):
    if x > 0:
        return 'Yes'
    else:
        return 'No'
"#;
        let build = build(source);
        let decision = node_id_by_label(&build, "x > 0");
        let yes = node_id_by_label(&build, "return 'Yes'");
        let no = node_id_by_label(&build, "return 'No'");

        assert!(edge_exists(&build, "start", decision.as_str(), None));
        assert!(edge_exists(&build, decision.as_str(), yes.as_str(), Some(EdgeLabel::Yes)));
        assert!(edge_exists(&build, decision.as_str(), no.as_str(), Some(EdgeLabel::No)));
        assert!(edge_exists(&build, yes.as_str(), "end", None));
        assert!(edge_exists(&build, no.as_str(), "end", None));
        // Both branches closed; nothing else reaches the end terminator.
        assert_eq!(build.graph().edges().len(), 5);
    }

    #[test]
    fn while_loop_wires_back_edge_and_exit() {
        let source = "def g(n):\n    while n > 0:\n        n -= 1\n";
        let build = build(source);
        let header = node_id_by_label(&build, "n > 0");
        let body = node_id_by_label(&build, "n -= 1");

        assert!(edge_exists(&build, header.as_str(), body.as_str(), Some(EdgeLabel::Yes)));
        assert!(edge_exists(&build, body.as_str(), header.as_str(), Some(EdgeLabel::LoopBack)));
        assert!(edge_exists(&build, header.as_str(), "end", Some(EdgeLabel::No)));

        let header_node = build.graph().nodes().get(&header).expect("header");
        assert_eq!(header_node.kind(), NodeKind::Loop);
    }

    #[test]
    fn branch_with_statement_after_it_joins_downstream() {
        let source = r#"
if a:
    x = 1
else:
    x = 2
done()
"#;
        let build = build(source);
        let done = node_id_by_label(&build, "done()");
        let left = node_id_by_label(&build, "x = 1");
        let right = node_id_by_label(&build, "x = 2");

        assert!(edge_exists(&build, left.as_str(), done.as_str(), None));
        assert!(edge_exists(&build, right.as_str(), done.as_str(), None));
        let incoming = build
            .graph()
            .edges()
            .values()
            .filter(|edge| edge.to_node_id() == &done)
            .count();
        assert_eq!(incoming, 2);
    }

    #[test]
    fn returning_branch_is_excluded_from_the_join() {
        let source = r#"
def f(x):
    if x:
        return x
    cleanup()
"#;
        let build = build(source);
        let decision = node_id_by_label(&build, "x");
        let cleanup = node_id_by_label(&build, "cleanup()");

        // Only the decision's "no" edge reaches the statement after the if.
        let incoming: Vec<_> = build
            .graph()
            .edges()
            .values()
            .filter(|edge| edge.to_node_id() == &cleanup)
            .collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from_node_id(), &decision);
        assert_eq!(incoming[0].label(), Some(EdgeLabel::No));
    }

    #[test]
    fn if_without_else_leaves_no_edge_open() {
        let source = "if a:\n    x = 1\ny = 2\n";
        let build = build(source);
        let decision = node_id_by_label(&build, "a");
        let after = node_id_by_label(&build, "y = 2");
        assert!(edge_exists(&build, decision.as_str(), after.as_str(), Some(EdgeLabel::No)));
    }

    #[test]
    fn break_exits_to_after_loop_and_continue_loops_back() {
        let source = r#"
while True:
    if stop:
        break
    if skip:
        continue
    work()
"#;
        let build = build(source);
        let header = node_id_by_label(&build, "True");
        let brk = node_id_by_label(&build, "break");
        let cont = node_id_by_label(&build, "continue");

        // break jumps past the loop: straight to the end terminator here.
        assert!(edge_exists(&build, brk.as_str(), "end", None));
        // continue returns to the loop test.
        assert!(edge_exists(
            &build,
            cont.as_str(),
            header.as_str(),
            Some(EdgeLabel::LoopBack)
        ));
        assert!(build.warnings().is_empty());
    }

    #[test]
    fn orphaned_break_degrades_with_warning() {
        let build = build("break\n");
        assert_eq!(build.warnings().len(), 1);
        assert_eq!(build.warnings()[0].construct(), "break");
        // Still a valid chart: start -> break -> end.
        assert_eq!(build.graph().nodes().len(), 3);
    }

    #[test]
    fn unknown_construct_degrades_with_warning() {
        let source = "match command:\n    case 'go':\n        pass\n";
        let build = build(source);
        assert!(build
            .warnings()
            .iter()
            .any(|warning| warning.construct() == "match_statement"));
        // The graph stays well-formed despite the degraded node.
        let reachable = query::flow::reachable(build.graph(), build.graph().start_node_id());
        assert_eq!(reachable.len(), build.graph().nodes().len());
    }

    #[test]
    fn statements_after_return_are_skipped_not_charted() {
        let source = "def f():\n    return 1\n    leftover()\n";
        let build = build(source);
        assert!(build
            .warnings()
            .iter()
            .any(|warning| warning.construct() == "unreachable"));
        assert!(build
            .graph()
            .nodes()
            .values()
            .all(|node| node.label() != "leftover()"));
    }

    #[test]
    fn io_statements_become_input_output_nodes() {
        let source = "name = input('who? ')\nprint(name)\n";
        let build = build(source);
        let read = node_id_by_label(&build, "name = input('who? ')");
        let write = node_id_by_label(&build, "print(name)");
        for node_id in [read, write] {
            let node = build.graph().nodes().get(&node_id).expect("node");
            assert_eq!(node.kind(), NodeKind::InputOutput);
        }
    }

    #[test]
    fn try_except_charts_as_decision_chain() {
        let source = r#"
try:
    risky()
except ValueError:
    recover()
finally:
    cleanup()
"#;
        let build = build(source);
        let head = node_id_by_label(&build, "try");
        let handler = node_id_by_label(&build, "except ValueError");
        let cleanup = node_id_by_label(&build, "cleanup()");

        assert!(edge_exists(&build, head.as_str(), handler.as_str(), Some(EdgeLabel::No)));
        // Unmatched exceptions leave the chart.
        assert!(edge_exists(&build, handler.as_str(), "end", Some(EdgeLabel::No)));
        // Both the happy path and the handler path flow into finally.
        let incoming = build
            .graph()
            .edges()
            .values()
            .filter(|edge| edge.to_node_id() == &cleanup)
            .count();
        assert_eq!(incoming, 2);
    }

    #[test]
    fn same_source_builds_identical_graphs() {
        let source = "def f(x):\n    while x:\n        if x > 2:\n            break\n        x -= 1\n";
        let first = build(source);
        let second = build(source);
        assert_eq!(first.graph(), second.graph());
    }

    #[test]
    fn every_node_is_reachable_from_start() {
        let source = r#"
def f(items):
    for item in items:
        if item:
            continue
        print(item)
    return len(items)
"#;
        let build = build(source);
        let reachable = query::flow::reachable(build.graph(), build.graph().start_node_id());
        assert_eq!(reachable.len(), build.graph().nodes().len());

        let degrees = query::flow::degrees(build.graph());
        let start_degree = degrees.get(build.graph().start_node_id()).expect("start");
        assert_eq!(start_degree.in_degree, 0);
    }

    #[test]
    fn raising_branch_closes_like_a_return() {
        let source = r#"
def f(x):
    if x < 0:
        raise ValueError('negative')
    return x
"#;
        let build = build(source);
        let decision = node_id_by_label(&build, "x < 0");
        let raising = node_id_by_label(&build, "raise ValueError('negative')");
        let returning = node_id_by_label(&build, "return x");

        assert!(edge_exists(&build, decision.as_str(), raising.as_str(), Some(EdgeLabel::Yes)));
        assert!(edge_exists(&build, raising.as_str(), "end", None));
        // The raising branch is closed; only the "no" edge reaches the return.
        assert!(edge_exists(&build, decision.as_str(), returning.as_str(), Some(EdgeLabel::No)));
        assert!(edge_exists(&build, returning.as_str(), "end", None));
        assert!(build.warnings().is_empty());
    }

    #[test]
    fn finally_still_charts_when_every_path_returns() {
        let source = r#"
def f():
    try:
        return 1
    except ValueError:
        return 2
    finally:
        cleanup()
"#;
        let build = build(source);
        let handler = node_id_by_label(&build, "except ValueError");
        let cleanup = node_id_by_label(&build, "cleanup()");

        // The finally body stays in the chart, wired on the path of an
        // unmatched exception.
        assert!(edge_exists(&build, handler.as_str(), cleanup.as_str(), Some(EdgeLabel::No)));
        assert!(!edge_exists(&build, handler.as_str(), "end", Some(EdgeLabel::No)));
        assert!(edge_exists(&build, cleanup.as_str(), "end", None));
        assert!(build.warnings().is_empty());

        let reachable = query::flow::reachable(build.graph(), build.graph().start_node_id());
        assert_eq!(reachable.len(), build.graph().nodes().len());
    }

    #[test]
    fn script_titles_collapse_like_statement_labels() {
        let module = parse_module("x = 1\n").expect("parse");

        let titled = build_flowchart(&module, Some("  weekly \"report\"\nrun  "));
        let start = titled
            .graph()
            .nodes()
            .get(titled.graph().start_node_id())
            .expect("start");
        assert_eq!(start.label(), "weekly 'report' run");

        let blank = build_flowchart(&module, Some("   "));
        let start = blank
            .graph()
            .nodes()
            .get(blank.graph().start_node_id())
            .expect("start");
        assert_eq!(start.label(), "script");
    }
}
