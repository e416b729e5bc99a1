//! Tarjan's strongly connected components on an explicit work stack.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use indexmap::IndexSet;
use itertools::Itertools;
use log::debug;

use super::Successors;

/// A maximal set of mutually reachable nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StronglyConnectedComponent<N: Hash + Eq> {
    root: N,
    nodes: IndexSet<N, ahash::RandomState>,
}

impl<N: Copy + Hash + Eq> StronglyConnectedComponent<N> {
    /// The member the depth-first search discovered first.
    pub fn root(&self) -> N {
        self.root
    }

    pub fn nodes(&self) -> &IndexSet<N, ahash::RandomState> {
        &self.nodes
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// A single node without a self-loop. Such a component contains no cycle.
    pub fn is_trivial<G: Successors<Node = N>>(&self, graph: &G) -> bool {
        self.nodes.len() == 1 && !graph.has_self_loop(self.root)
    }
}

struct Frame<N> {
    node: N,
    successors: Vec<N>,
    next: usize,
}

struct Tarjan<'g, G: Successors> {
    graph: &'g G,
    excluded: &'g AHashSet<G::Node>,
    counter: usize,
    index: AHashMap<G::Node, usize>,
    low_link: AHashMap<G::Node, usize>,
    stack: Vec<G::Node>,
    on_stack: AHashSet<G::Node>,
    call_stack: Vec<Frame<G::Node>>,
    sccs: Vec<StronglyConnectedComponent<G::Node>>,
}

impl<'g, G: Successors> Tarjan<'g, G> {
    fn new(graph: &'g G, excluded: &'g AHashSet<G::Node>) -> Self {
        Tarjan {
            graph,
            excluded,
            counter: 0,
            index: AHashMap::new(),
            low_link: AHashMap::new(),
            stack: Vec::new(),
            on_stack: AHashSet::new(),
            call_stack: Vec::new(),
            sccs: Vec::new(),
        }
    }

    fn discover(&mut self, node: G::Node) {
        self.index.insert(node, self.counter);
        self.low_link.insert(node, self.counter);
        self.counter += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let successors = self
            .graph
            .successors(node)
            .filter(|s| !self.excluded.contains(s))
            .unique()
            .collect();
        self.call_stack.push(Frame {
            node,
            successors,
            next: 0,
        });
    }

    fn lower(&mut self, node: G::Node, candidate: usize) {
        let low = self
            .low_link
            .get_mut(&node)
            .expect("node on the call stack has a low-link");
        *low = (*low).min(candidate);
    }

    fn strong_connect(&mut self, start: G::Node) {
        self.discover(start);

        while let Some(frame) = self.call_stack.last_mut() {
            let v = frame.node;
            if let Some(&w) = frame.successors.get(frame.next) {
                frame.next += 1;
                if !self.index.contains_key(&w) {
                    self.discover(w);
                } else if self.on_stack.contains(&w) {
                    let w_index = self.index[&w];
                    self.lower(v, w_index);
                }
                continue;
            }

            self.call_stack.pop();
            let v_low = self.low_link[&v];
            if let Some(parent) = self.call_stack.last() {
                let parent = parent.node;
                self.lower(parent, v_low);
            }

            if v_low == self.index[&v] {
                let mut nodes = IndexSet::default();
                while let Some(w) = self.stack.pop() {
                    self.on_stack.remove(&w);
                    nodes.insert(w);
                    if w == v {
                        break;
                    }
                }
                self.sccs
                    .push(StronglyConnectedComponent { root: v, nodes });
            }
        }
    }
}

/// Computes all strongly connected components reachable from `nodes`.
///
/// Nodes in `excluded` are invisible: they are neither started from nor
/// entered through an edge. Every visited node ends up in exactly one
/// component, including single-node components without a cycle. Components
/// are returned in reverse completion order, so a component precedes every
/// component reachable from it.
pub fn find_sccs<G: Successors>(
    graph: &G,
    nodes: &[G::Node],
    excluded: &AHashSet<G::Node>,
) -> Vec<StronglyConnectedComponent<G::Node>> {
    let mut tarjan = Tarjan::new(graph, excluded);

    for &node in nodes {
        if excluded.contains(&node) || tarjan.index.contains_key(&node) {
            continue;
        }
        tarjan.strong_connect(node);
    }

    let mut sccs = tarjan.sccs;
    sccs.reverse();
    debug!(
        "found {} strongly connected components over {} nodes",
        sccs.len(),
        tarjan.index.len()
    );
    sccs
}
