//! Loop structure of a [`Cfa`], derived from its strongly connected
//! components.
//!
//! Loops are intraprocedural: call and return edges are ignored, summary
//! edges are followed. A recursive call therefore never forms a loop.

use ahash::AHashSet;
use indexmap::IndexSet;
use log::debug;

use crate::graph::{find_sccs, Successors};

use super::{Cfa, CfaNodeId, EdgeIndex};

/// View of a CFA without call and return edges.
struct Intraprocedural<'a>(&'a Cfa);

impl Successors for Intraprocedural<'_> {
    type Node = CfaNodeId;

    fn successors(&self, node: CfaNodeId) -> impl Iterator<Item = CfaNodeId> + '_ {
        self.0
            .leaving_edges(node)
            .filter(|e| !e.kind.is_interprocedural())
            .map(|e| e.successor)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loop {
    nodes: IndexSet<CfaNodeId, ahash::RandomState>,
    heads: Vec<CfaNodeId>,
    incoming_edges: Vec<EdgeIndex>,
    outgoing_edges: Vec<EdgeIndex>,
    inner_edges: Vec<EdgeIndex>,
}

impl Loop {
    /// Member nodes, by increasing id.
    pub fn nodes(&self) -> &IndexSet<CfaNodeId, ahash::RandomState> {
        &self.nodes
    }

    pub fn contains(&self, node: CfaNodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn heads(&self) -> &[CfaNodeId] {
        &self.heads
    }

    /// Edges entering the loop from outside.
    pub fn incoming_edges(&self) -> &[EdgeIndex] {
        &self.incoming_edges
    }

    /// Edges leaving the loop.
    pub fn outgoing_edges(&self) -> &[EdgeIndex] {
        &self.outgoing_edges
    }

    pub fn inner_edges(&self) -> &[EdgeIndex] {
        &self.inner_edges
    }

    fn new(cfa: &Cfa, mut members: Vec<CfaNodeId>) -> Self {
        members.sort_unstable();
        let nodes: IndexSet<_, ahash::RandomState> = members.into_iter().collect();

        let mut incoming_edges = Vec::new();
        let mut outgoing_edges = Vec::new();
        let mut inner_edges = Vec::new();
        for edge in cfa.iter_edges().filter(|e| !e.kind.is_interprocedural()) {
            match (nodes.contains(&edge.predecessor), nodes.contains(&edge.successor)) {
                (true, true) => inner_edges.push(edge.index),
                (true, false) => outgoing_edges.push(edge.index),
                (false, true) => incoming_edges.push(edge.index),
                (false, false) => {}
            }
        }

        let mut heads: Vec<_> = nodes
            .iter()
            .copied()
            .filter(|n| cfa[*n].is_loop_start)
            .collect();
        if heads.is_empty() {
            let entered: AHashSet<_> = incoming_edges
                .iter()
                .map(|e| cfa.edge(*e).successor)
                .collect();
            heads = nodes.iter().copied().filter(|n| entered.contains(n)).collect();
        }
        if heads.is_empty() {
            heads.extend(nodes.first().copied());
        }

        Loop {
            nodes,
            heads,
            incoming_edges,
            outgoing_edges,
            inner_edges,
        }
    }
}

/// All loops of `cfa`, one per non-trivial strongly connected component,
/// ordered by their lowest node id.
pub fn find_loops(cfa: &Cfa) -> Vec<Loop> {
    let view = Intraprocedural(cfa);
    let mut loops: Vec<_> = find_sccs(&view, &cfa.node_ids(), &AHashSet::new())
        .into_iter()
        .filter(|scc| !scc.is_trivial(&view))
        .map(|scc| Loop::new(cfa, scc.nodes().iter().copied().collect()))
        .collect();
    loops.sort_by_key(|l| l.nodes.first().copied());
    debug!("found {} loops in a CFA of {} nodes", loops.len(), cfa.n_nodes());
    loops
}

pub fn all_loop_heads(cfa: &Cfa) -> IndexSet<CfaNodeId, ahash::RandomState> {
    find_loops(cfa)
        .into_iter()
        .flat_map(|l| l.heads)
        .collect()
}
