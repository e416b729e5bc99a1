//! Depth-first walks over a [`Cfa`], configurable in direction and in which
//! edges they follow.

use ahash::AHashSet;
use indexmap::IndexSet;

use super::{Cfa, CfaEdge, CfaEdgeKind, CfaNode, CfaNodeId};

/// What a visitor wants the traversal to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalProcess {
    Continue,
    /// Do not go further from here, but keep traversing elsewhere.
    Skip,
    Abort,
}

pub trait CfaVisitor {
    fn visit_node(&mut self, _node: &CfaNode) -> TraversalProcess {
        TraversalProcess::Continue
    }

    fn visit_edge(&mut self, _edge: &CfaEdge) -> TraversalProcess {
        TraversalProcess::Continue
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CfaTraversal {
    direction: Direction,
    ignore_function_calls: bool,
    ignore_summary_edges: bool,
}

impl CfaTraversal {
    /// Follows leaving edges, including calls, returns and summary edges.
    pub fn forward() -> Self {
        CfaTraversal {
            direction: Direction::Forward,
            ignore_function_calls: false,
            ignore_summary_edges: false,
        }
    }

    /// Follows entering edges instead.
    pub fn backward() -> Self {
        CfaTraversal {
            direction: Direction::Backward,
            ..Self::forward()
        }
    }

    /// Stays inside the current function: call and return edges are not
    /// followed. Summary edges still are, unless ignored as well.
    pub fn ignore_function_calls(self) -> Self {
        CfaTraversal {
            ignore_function_calls: true,
            ..self
        }
    }

    pub fn ignore_summary_edges(self) -> Self {
        CfaTraversal {
            ignore_summary_edges: true,
            ..self
        }
    }

    fn follows(&self, edge: &CfaEdge) -> bool {
        let call = self.ignore_function_calls && edge.kind.is_interprocedural();
        let summary = self.ignore_summary_edges && edge.kind == CfaEdgeKind::CallToReturn;
        !(call || summary)
    }

    fn edges<'a>(&self, cfa: &'a Cfa, node: CfaNodeId) -> impl Iterator<Item = &'a CfaEdge> {
        let node = &cfa[node];
        let edges = match self.direction {
            Direction::Forward => node.leaving_edges(),
            Direction::Backward => node.entering_edges(),
        };
        let this = *self;
        edges
            .iter()
            .map(move |e| cfa.edge(*e))
            .filter(move |e| this.follows(e))
    }

    fn next_node(&self, edge: &CfaEdge) -> CfaNodeId {
        match self.direction {
            Direction::Forward => edge.successor,
            Direction::Backward => edge.predecessor,
        }
    }

    /// Walks from `start`, entering every node at most once. A node reached
    /// again through another edge is not visited again, but the edge is.
    pub fn traverse_once(&self, cfa: &Cfa, start: CfaNodeId, visitor: &mut impl CfaVisitor) {
        let mut seen = AHashSet::new();
        let mut stack = vec![start];

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            match visitor.visit_node(&cfa[id]) {
                TraversalProcess::Abort => return,
                TraversalProcess::Skip => continue,
                TraversalProcess::Continue => {}
            }

            // pushed in reverse so the first edge is explored first
            let edges: Vec<_> = self.edges(cfa, id).collect();
            let mut next = Vec::with_capacity(edges.len());
            for edge in edges {
                match visitor.visit_edge(edge) {
                    TraversalProcess::Abort => return,
                    TraversalProcess::Skip => {}
                    TraversalProcess::Continue => next.push(self.next_node(edge)),
                }
            }
            stack.extend(next.into_iter().rev());
        }
    }

    /// Every node reachable from `start`, `start` included, in visiting order.
    pub fn collect_nodes_reachable_from(
        &self,
        cfa: &Cfa,
        start: CfaNodeId,
    ) -> IndexSet<CfaNodeId, ahash::RandomState> {
        let mut collector = NodeCollector::default();
        self.traverse_once(cfa, start, &mut collector);
        collector.nodes
    }

    /// Lazy depth-first iterator over the edges reachable from `start`.
    pub fn edges_from<'a>(&self, cfa: &'a Cfa, start: CfaNodeId) -> CfaEdgeDfs<'a> {
        let mut dfs = CfaEdgeDfs {
            cfa,
            traversal: *self,
            stack: Vec::new(),
            expanded: AHashSet::new(),
        };
        dfs.expand(start);
        dfs
    }
}

/// Records visited nodes.
#[derive(Debug, Default)]
pub struct NodeCollector {
    pub nodes: IndexSet<CfaNodeId, ahash::RandomState>,
}

impl CfaVisitor for NodeCollector {
    fn visit_node(&mut self, node: &CfaNode) -> TraversalProcess {
        self.nodes.insert(node.id);
        TraversalProcess::Continue
    }
}

/// See [`CfaTraversal::edges_from`]. Each edge is yielded once.
pub struct CfaEdgeDfs<'a> {
    cfa: &'a Cfa,
    traversal: CfaTraversal,
    stack: Vec<&'a CfaEdge>,
    expanded: AHashSet<CfaNodeId>,
}

impl<'a> CfaEdgeDfs<'a> {
    fn expand(&mut self, node: CfaNodeId) {
        if self.expanded.insert(node) {
            let edges: Vec<_> = self.traversal.edges(self.cfa, node).collect();
            self.stack.extend(edges.into_iter().rev());
        }
    }
}

impl<'a> Iterator for CfaEdgeDfs<'a> {
    type Item = &'a CfaEdge;

    fn next(&mut self) -> Option<Self::Item> {
        let edge = self.stack.pop()?;
        self.expand(self.traversal.next_node(edge));
        Some(edge)
    }
}

#[cfg(test)]
mod test {
    use crate::cfa::test::counting_loop;

    use super::*;

    #[test]
    fn forward_reaches_everything_from_main() {
        let p = counting_loop();
        let reached = CfaTraversal::forward().collect_nodes_reachable_from(&p.cfa, p.main_entry);
        assert_eq!(reached.len(), p.cfa.n_nodes());
        assert_eq!(reached.first(), Some(&p.main_entry));
    }

    #[test]
    fn ignoring_calls_stays_in_the_function() {
        let p = counting_loop();
        let reached = CfaTraversal::forward()
            .ignore_function_calls()
            .collect_nodes_reachable_from(&p.cfa, p.main_entry);
        assert!(!reached.contains(&p.f_entry));
        assert!(reached.contains(&p.return_site));

        let cut = CfaTraversal::forward()
            .ignore_function_calls()
            .ignore_summary_edges()
            .collect_nodes_reachable_from(&p.cfa, p.main_entry);
        assert!(!cut.contains(&p.return_site));
        assert!(cut.contains(&p.after));
    }

    #[test]
    fn backward_from_the_exit() {
        let p = counting_loop();
        let reached = CfaTraversal::backward()
            .ignore_function_calls()
            .collect_nodes_reachable_from(&p.cfa, p.f_exit);
        assert_eq!(reached.into_iter().collect::<Vec<_>>(), [p.f_exit, p.f_entry]);
    }

    struct StopAt(CfaNodeId, Vec<CfaNodeId>);

    impl CfaVisitor for StopAt {
        fn visit_node(&mut self, node: &CfaNode) -> TraversalProcess {
            self.1.push(node.id);
            if node.id == self.0 {
                TraversalProcess::Abort
            } else {
                TraversalProcess::Continue
            }
        }

        fn visit_edge(&mut self, edge: &CfaEdge) -> TraversalProcess {
            if edge.kind == (CfaEdgeKind::Assume { truth: true }) {
                TraversalProcess::Skip
            } else {
                TraversalProcess::Continue
            }
        }
    }

    #[test]
    fn visitor_can_skip_and_abort() {
        let p = counting_loop();
        let mut visitor = StopAt(p.after, Vec::new());
        CfaTraversal::forward().traverse_once(&p.cfa, p.main_entry, &mut visitor);
        // the loop body is skipped and nothing past `after` is entered
        assert!(!visitor.1.contains(&p.body));
        assert_eq!(visitor.1.last(), Some(&p.after));
        assert_eq!(visitor.1.len(), 4);
    }

    #[test]
    fn edge_dfs_yields_each_edge_once() {
        let p = counting_loop();
        let edges: Vec<_> = CfaTraversal::forward()
            .edges_from(&p.cfa, p.main_entry)
            .map(|e| e.index)
            .collect();
        assert_eq!(edges.len(), p.cfa.n_edges());
        let unique: AHashSet<_> = edges.iter().collect();
        assert_eq!(unique.len(), edges.len());

        let intraprocedural = CfaTraversal::forward()
            .ignore_function_calls()
            .edges_from(&p.cfa, p.main_entry)
            .count();
        assert_eq!(intraprocedural, 7);
    }
}
