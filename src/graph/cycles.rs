//! Johnson's algorithm for enumerating all elementary circuits.
//!
//! The driver walks an explicitly ordered node list. In each round the nodes
//! before the current start index are hidden, the strongly connected
//! components of what remains are computed, and the circuits through the
//! lowest-indexed node of a non-trivial component are enumerated. That node is
//! then hidden as well and the next round starts. Because the start index is
//! the only progress measure, the order of the input slice fully determines
//! the enumeration order; hash-ordered collections must not be used as input.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use bitvec::vec::BitVec;
use indexmap::IndexSet;
use itertools::Itertools;
use log::debug;

use super::{find_sccs, StronglyConnectedComponent, Successors};

/// Circuit search restricted to one strongly connected component. Nodes are
/// addressed by their position in the component's node set so that the
/// blocked set can be a bit vector.
struct CircuitSearch<'a, N: Hash + Eq> {
    members: &'a IndexSet<N, ahash::RandomState>,
    successors: Vec<Vec<usize>>,
    blocked: BitVec,
    blocked_map: Vec<AHashSet<usize>>,
}

struct Frame {
    node: usize,
    next: usize,
    found: bool,
}

impl<'a, N: Copy + Hash + Eq> CircuitSearch<'a, N> {
    fn new<G: Successors<Node = N>>(graph: &G, scc: &'a StronglyConnectedComponent<N>) -> Self {
        let members = scc.nodes();
        let successors = members
            .iter()
            .map(|n| {
                graph
                    .successors(*n)
                    .filter_map(|s| members.get_index_of(&s))
                    .unique()
                    .collect()
            })
            .collect();
        CircuitSearch {
            members,
            successors,
            blocked: BitVec::repeat(false, members.len()),
            blocked_map: vec![AHashSet::new(); members.len()],
        }
    }

    fn unblock(&mut self, node: usize) {
        let mut work = vec![node];
        while let Some(u) = work.pop() {
            self.blocked.set(u, false);
            for w in std::mem::take(&mut self.blocked_map[u]) {
                if self.blocked[w] {
                    work.push(w);
                }
            }
        }
    }

    fn enter(&mut self, path: &mut Vec<usize>, frames: &mut Vec<Frame>, node: usize) {
        path.push(node);
        self.blocked.set(node, true);
        frames.push(Frame {
            node,
            next: 0,
            found: false,
        });
    }

    /// All circuits through `start`, each as the path beginning at `start`.
    fn circuits_through(&mut self, start: usize, cycles: &mut Vec<Vec<N>>) {
        let mut path = Vec::new();
        let mut frames = Vec::new();
        self.enter(&mut path, &mut frames, start);

        while let Some(frame) = frames.last_mut() {
            let v = frame.node;
            if let Some(&w) = self.successors[v].get(frame.next) {
                frame.next += 1;
                if w == start {
                    frame.found = true;
                    cycles.push(path.iter().map(|i| self.members[*i]).collect());
                } else if !self.blocked[w] {
                    self.enter(&mut path, &mut frames, w);
                }
                continue;
            }

            let found = frame.found;
            frames.pop();
            path.pop();
            if found {
                self.unblock(v);
            } else {
                for i in 0..self.successors[v].len() {
                    let w = self.successors[v][i];
                    self.blocked_map[w].insert(v);
                }
            }
            if let Some(parent) = frames.last_mut() {
                parent.found |= found;
            }
        }
    }
}

/// Enumerates every elementary cycle among the non-excluded nodes.
///
/// Each cycle is returned as the ordered path `s, v1, .., vk`; the closing
/// edge `vk -> s` is implied and `s` is not repeated. `nodes` fixes the
/// enumeration order and should list every node of the graph that may lie on
/// a cycle.
pub fn find_all_elementary_cycles<G: Successors>(
    graph: &G,
    nodes: &[G::Node],
    excluded: &AHashSet<G::Node>,
) -> Vec<Vec<G::Node>> {
    let mut position: AHashMap<G::Node, usize> = AHashMap::with_capacity(nodes.len());
    for (i, n) in nodes.iter().enumerate() {
        position.entry(*n).or_insert(i);
    }

    let mut excluded = excluded.clone();
    let mut cycles = Vec::new();
    let mut start = 0;
    let mut rounds = 0;

    while start < nodes.len() {
        rounds += 1;
        let candidates = find_sccs(graph, &nodes[start..], &excluded)
            .into_iter()
            .filter(|scc| !scc.is_trivial(graph))
            .filter_map(|scc| {
                let least = scc
                    .nodes()
                    .iter()
                    .filter_map(|n| position.get(n).map(|p| (*p, *n)))
                    .min_by_key(|(p, _)| *p)?;
                Some((least, scc))
            })
            .min_by_key(|((p, _), _)| *p);

        let Some(((least_position, least), scc)) = candidates else {
            break;
        };

        let mut search = CircuitSearch::new(graph, &scc);
        let local = scc
            .nodes()
            .get_index_of(&least)
            .expect("least node is a member of its component");
        search.circuits_through(local, &mut cycles);

        for n in &nodes[start..=least_position] {
            excluded.insert(*n);
        }
        start = least_position + 1;
    }

    debug!(
        "enumerated {} elementary cycles in {rounds} rounds",
        cycles.len()
    );
    cycles
}

/// The elementary cycles that pass through `node`, each rotated to start at it.
pub fn find_cycles_through<G: Successors>(
    graph: &G,
    nodes: &[G::Node],
    excluded: &AHashSet<G::Node>,
    node: G::Node,
) -> Vec<Vec<G::Node>> {
    find_all_elementary_cycles(graph, nodes, excluded)
        .into_iter()
        .filter_map(|mut cycle| {
            let at = cycle.iter().position(|n| *n == node)?;
            cycle.rotate_left(at);
            Some(cycle)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use ahash::AHashSet;

    use crate::graph::{edge_list::parse_edge_list, DiGraph};

    use super::{find_all_elementary_cycles, find_cycles_through};

    fn names(graph: &DiGraph<String>, cycles: &[Vec<crate::graph::NodeIndex>]) -> Vec<String> {
        cycles
            .iter()
            .map(|c| c.iter().map(|n| graph[*n].as_str()).collect::<Vec<_>>().join(" "))
            .collect()
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let graph = parse_edge_list("a -> b -> c\na -> c").unwrap();
        let cycles = find_all_elementary_cycles(&graph, &graph.node_indices(), &AHashSet::new());
        assert!(cycles.is_empty());
    }

    #[test]
    fn triangle_with_chord() {
        let graph = parse_edge_list(
            "a -> b -> c -> a
             b -> a",
        )
        .unwrap();
        let cycles = find_all_elementary_cycles(&graph, &graph.node_indices(), &AHashSet::new());
        assert_eq!(names(&graph, &cycles), vec!["a b c", "a b"]);
    }

    #[test]
    fn complete_graph_on_three_nodes() {
        let graph = parse_edge_list(
            "a -> b\na -> c\nb -> a\nb -> c\nc -> a\nc -> b",
        )
        .unwrap();
        let cycles = find_all_elementary_cycles(&graph, &graph.node_indices(), &AHashSet::new());
        // three 2-cycles and two 3-cycles
        assert_eq!(cycles.len(), 5);
        assert_eq!(cycles.iter().filter(|c| c.len() == 2).count(), 3);
        assert_eq!(cycles.iter().filter(|c| c.len() == 3).count(), 2);
    }

    #[test]
    fn self_loops_and_exclusion() {
        let graph = parse_edge_list("a -> a\na -> b -> a\nb -> b").unwrap();
        let all = find_all_elementary_cycles(&graph, &graph.node_indices(), &AHashSet::new());
        assert_eq!(names(&graph, &all), vec!["a", "a b", "b"]);

        let a = graph.find_node(&"a".to_string()).unwrap();
        let without_a =
            find_all_elementary_cycles(&graph, &graph.node_indices(), &AHashSet::from_iter([a]));
        assert_eq!(names(&graph, &without_a), vec!["b"]);
    }

    #[test]
    fn order_of_input_decides_start_nodes() {
        let graph = parse_edge_list("a -> b -> c -> a").unwrap();
        let mut order = graph.node_indices();
        order.reverse();
        let cycles = find_all_elementary_cycles(&graph, &order, &AHashSet::new());
        assert_eq!(names(&graph, &cycles), vec!["c a b"]);
    }

    #[test]
    fn cycles_through_a_node_are_rotated() {
        let graph = parse_edge_list("a -> b -> c -> a\nc -> d -> c").unwrap();
        let d = graph.find_node(&"d".to_string()).unwrap();
        let cycles = find_cycles_through(&graph, &graph.node_indices(), &AHashSet::new(), d);
        assert_eq!(names(&graph, &cycles), vec!["d c"]);
    }
}
