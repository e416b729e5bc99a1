//! # Directed Graph Utilities
//!
//! Generic algorithms over anything that can enumerate the successors of a
//! node, plus a small owned adjacency-list graph to run them on.
//!
//! ## Graph access
//!
//! - [`Successors`]: the only capability the algorithms need. Nodes are small
//!   `Copy` handles compared by `Eq`/`Hash`.
//! - [`DiGraph`]: owned adjacency lists indexed by [`NodeIndex`].
//! - [`IdentityGraph`]: borrows externally owned nodes and compares them by
//!   address, the way states of an abstract reachability graph are compared.
//!
//! ## Algorithms
//!
//! - [`scc::find_sccs`]: Tarjan's strongly connected components.
//! - [`cycles::find_all_elementary_cycles`]: Johnson's elementary circuits.
//!
//! Both run on explicit work stacks, so deep graphs cannot overflow the call
//! stack. Neither checks for cancellation; callers that need a bound must
//! restrict the node list they pass in.

use std::{fmt::Write, hash::Hash, marker::PhantomData};

use by_address::ByAddress;

use crate::define_indexed_vec;

pub mod cycles;
pub mod edge_list;
pub mod scc;

pub use cycles::find_all_elementary_cycles;
pub use scc::{find_sccs, StronglyConnectedComponent};

/// Successor access for a directed graph.
pub trait Successors {
    type Node: Copy + Eq + Hash;

    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    fn has_self_loop(&self, node: Self::Node) -> bool {
        self.successors(node).any(|s| s == node)
    }
}

impl<G: Successors> Successors for &G {
    type Node = G::Node;

    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_ {
        (**self).successors(node)
    }
}

define_indexed_vec!(
    /// Position of a node in a [`DiGraph`].
    pub struct NodeIndex;

    pub struct NodeVec;
);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiGraph<V> {
    data: NodeVec<V>,
    successors: NodeVec<Vec<NodeIndex>>,
}

impl<V> Default for DiGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> DiGraph<V> {
    pub fn new() -> Self {
        DiGraph {
            data: NodeVec::new(),
            successors: NodeVec::new(),
        }
    }

    pub fn add_node(&mut self, data: V) -> NodeIndex {
        self.successors.push(Vec::new());
        self.data.push(data)
    }

    /// Adds the edge `from -> to`. Adding an existing edge again is a no-op.
    ///
    /// # Panics
    /// If either endpoint is not a node of this graph.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        assert!(
            from.0 < self.n_nodes(),
            "Edge source {from} out of bounds (len={})",
            self.n_nodes()
        );
        assert!(
            to.0 < self.n_nodes(),
            "Edge target {to} out of bounds (len={})",
            self.n_nodes()
        );
        let succ = &mut self.successors[from];
        if !succ.contains(&to) {
            succ.push(to);
        }
    }

    pub fn has_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.successors
            .get(from)
            .is_some_and(|succ| succ.contains(&to))
    }

    pub fn n_nodes(&self) -> usize {
        self.data.len()
    }

    pub fn n_edges(&self) -> usize {
        self.successors.iter().map(|(_, s)| s.len()).sum()
    }

    /// All node indices, in insertion order.
    pub fn node_indices(&self) -> Vec<NodeIndex> {
        self.data.indices().collect()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (NodeIndex, &V)> {
        self.data.iter()
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.successors
            .iter()
            .flat_map(|(from, succ)| succ.iter().map(move |to| (from, *to)))
    }

    pub fn find_node(&self, data: &V) -> Option<NodeIndex>
    where
        V: PartialEq,
    {
        self.data.iter().find(|(_, d)| *d == data).map(|(i, _)| i)
    }

    /// Serializes the graph in the DOT language, one `label` per node.
    pub fn dot(&self, node_label: impl Fn(&V) -> String) -> String {
        let mut out = String::new();
        self.dot_fmt(&mut out, node_label)
            .expect("writing to a String cannot fail");
        out
    }

    pub fn dot_fmt(
        &self,
        writer: &mut impl Write,
        node_label: impl Fn(&V) -> String,
    ) -> std::fmt::Result {
        writeln!(writer, "digraph {{")?;
        for (i, v) in self.data.iter() {
            writeln!(writer, "  {i} [label={:?}];", node_label(v))?;
        }
        for (from, to) in self.iter_edges() {
            writeln!(writer, "  {from} -> {to};")?;
        }
        writeln!(writer, "}}")
    }
}

impl<V> std::ops::Index<NodeIndex> for DiGraph<V> {
    type Output = V;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.data[index]
    }
}

impl<V> Successors for DiGraph<V> {
    type Node = NodeIndex;

    fn successors(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.successors[node].iter().copied()
    }
}

/// Graph view over externally owned nodes, compared by address.
///
/// ```
/// use by_address::ByAddress;
/// use cpa_utils::graph::{find_sccs, IdentityGraph};
///
/// struct State {
///     children: Vec<usize>,
/// }
/// let arena = vec![State { children: vec![1] }, State { children: vec![0] }];
/// let arena = &arena;
/// let graph = IdentityGraph::<State, _>::new(move |s| s.children.iter().map(move |c| &arena[*c]));
/// let nodes: Vec<_> = arena.iter().map(ByAddress).collect();
/// let sccs = find_sccs(&graph, &nodes, &Default::default());
/// assert_eq!(sccs.len(), 1);
/// ```
pub struct IdentityGraph<'a, T: ?Sized, F> {
    children: F,
    _nodes: PhantomData<&'a T>,
}

impl<'a, T: ?Sized, F, I> IdentityGraph<'a, T, F>
where
    F: Fn(&'a T) -> I,
    I: IntoIterator<Item = &'a T>,
{
    pub fn new(children: F) -> Self {
        IdentityGraph {
            children,
            _nodes: PhantomData,
        }
    }
}

impl<'a, T: ?Sized, F, I> Successors for IdentityGraph<'a, T, F>
where
    F: Fn(&'a T) -> I,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: 'a,
{
    type Node = ByAddress<&'a T>;

    fn successors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_ {
        (self.children)(node.0).into_iter().map(ByAddress)
    }
}
