//! # Control-Flow Automata
//!
//! A minimal CFA model: numbered nodes grouped by function, connected by
//! typed edges that carry the code they stand for. It is what the traversal
//! and loop helpers in [`traversal`] and [`loops`] operate on. Turning C
//! source into a CFA is the front end's job; here automata are assembled
//! explicitly through [`CfaBuilder`].

use std::fmt;

use derive_more::{From, Into};
use indexmap::IndexMap;

use crate::{context::UniqueIdGenerator, define_indexed_vec, graph::Successors};

pub mod loops;
pub mod traversal;

/// Node number, unique within one [`UniqueIdGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CfaNodeId(pub usize);

impl fmt::Display for CfaNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

define_indexed_vec!(
    pub struct EdgeIndex;

    pub struct EdgeVec;
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CfaNodeKind {
    Normal,
    FunctionEntry,
    FunctionExit,
    /// End of the program, no leaving edges.
    Termination,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CfaNode {
    pub id: CfaNodeId,
    pub function: String,
    pub kind: CfaNodeKind,
    pub is_loop_start: bool,
    entering: Vec<EdgeIndex>,
    leaving: Vec<EdgeIndex>,
}

impl CfaNode {
    pub fn entering_edges(&self) -> &[EdgeIndex] {
        &self.entering
    }

    pub fn leaving_edges(&self) -> &[EdgeIndex] {
        &self.leaving
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CfaEdgeKind {
    Blank,
    Statement,
    Assume { truth: bool },
    Declaration,
    /// From a call site into the callee's entry.
    FunctionCall,
    /// From the callee's exit back to the return site.
    FunctionReturn,
    /// Summary edge from a call site straight to its return site.
    CallToReturn,
    /// A `return` statement, leading to the function exit.
    Return,
}

impl CfaEdgeKind {
    pub fn is_interprocedural(self) -> bool {
        matches!(self, CfaEdgeKind::FunctionCall | CfaEdgeKind::FunctionReturn)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CfaEdge {
    pub index: EdgeIndex,
    pub predecessor: CfaNodeId,
    pub successor: CfaNodeId,
    pub kind: CfaEdgeKind,
    pub code: String,
}

impl fmt::Display for CfaEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -{{", self.predecessor)?;
        match self.kind {
            CfaEdgeKind::Assume { truth: false } => write!(f, "[!({})]", self.code)?,
            CfaEdgeKind::Assume { truth: true } => write!(f, "[{}]", self.code)?,
            _ => write!(f, "{}", self.code)?,
        }
        write!(f, "}}-> {}", self.successor)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Cfa {
    nodes: IndexMap<CfaNodeId, CfaNode, ahash::RandomState>,
    edges: EdgeVec<CfaEdge>,
    main_entry: Option<CfaNodeId>,
}

impl Cfa {
    pub fn node(&self, id: CfaNodeId) -> Option<&CfaNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, index: EdgeIndex) -> &CfaEdge {
        &self.edges[index]
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// All node ids in creation order.
    pub fn node_ids(&self) -> Vec<CfaNodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = &CfaNode> {
        self.nodes.values()
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = &CfaEdge> {
        self.edges.iter().map(|(_, e)| e)
    }

    pub fn leaving_edges(&self, id: CfaNodeId) -> impl Iterator<Item = &CfaEdge> {
        self[id].leaving.iter().map(|e| &self.edges[*e])
    }

    pub fn entering_edges(&self, id: CfaNodeId) -> impl Iterator<Item = &CfaEdge> {
        self[id].entering.iter().map(|e| &self.edges[*e])
    }

    pub fn successors_of(&self, id: CfaNodeId) -> impl Iterator<Item = CfaNodeId> + '_ {
        self.leaving_edges(id).map(|e| e.successor)
    }

    pub fn predecessors_of(&self, id: CfaNodeId) -> impl Iterator<Item = CfaNodeId> + '_ {
        self.entering_edges(id).map(|e| e.predecessor)
    }

    pub fn main_entry(&self) -> Option<CfaNodeId> {
        self.main_entry
    }

    /// `(function name, entry node)` for every function, in creation order.
    pub fn function_entries(&self) -> impl Iterator<Item = (&str, CfaNodeId)> {
        self.nodes
            .values()
            .filter(|n| n.kind == CfaNodeKind::FunctionEntry)
            .map(|n| (n.function.as_str(), n.id))
    }

    pub fn function_entry(&self, function: &str) -> Option<CfaNodeId> {
        self.function_entries()
            .find(|(name, _)| *name == function)
            .map(|(_, id)| id)
    }
}

impl std::ops::Index<CfaNodeId> for Cfa {
    type Output = CfaNode;

    fn index(&self, id: CfaNodeId) -> &Self::Output {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("{id} is not a node of this CFA"))
    }
}

impl Successors for Cfa {
    type Node = CfaNodeId;

    fn successors(&self, node: CfaNodeId) -> impl Iterator<Item = CfaNodeId> + '_ {
        self.successors_of(node)
    }
}

/// Assembles a [`Cfa`], numbering nodes from a shared id generator.
pub struct CfaBuilder<'g> {
    ids: &'g UniqueIdGenerator,
    cfa: Cfa,
}

impl<'g> CfaBuilder<'g> {
    pub fn new(ids: &'g UniqueIdGenerator) -> Self {
        CfaBuilder {
            ids,
            cfa: Cfa::default(),
        }
    }

    pub fn add_node(&mut self, function: impl Into<String>, kind: CfaNodeKind) -> CfaNodeId {
        let id = CfaNodeId(self.ids.next_id());
        self.cfa.nodes.insert(
            id,
            CfaNode {
                id,
                function: function.into(),
                kind,
                is_loop_start: false,
                entering: Vec::new(),
                leaving: Vec::new(),
            },
        );
        id
    }

    fn node_mut(&mut self, id: CfaNodeId) -> &mut CfaNode {
        self.cfa
            .nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("{id} was not created by this builder"))
    }

    pub fn mark_loop_start(&mut self, id: CfaNodeId) -> &mut Self {
        self.node_mut(id).is_loop_start = true;
        self
    }

    /// # Panics
    /// If either endpoint was not created by this builder, or the predecessor
    /// is a termination node.
    pub fn add_edge(
        &mut self,
        predecessor: CfaNodeId,
        successor: CfaNodeId,
        kind: CfaEdgeKind,
        code: impl Into<String>,
    ) -> EdgeIndex {
        assert_ne!(
            self.node_mut(predecessor).kind,
            CfaNodeKind::Termination,
            "termination node {predecessor} cannot have leaving edges"
        );
        assert!(
            self.cfa.nodes.contains_key(&successor),
            "{successor} was not created by this builder"
        );

        let index = self.cfa.edges.push(CfaEdge {
            index: EdgeIndex(self.cfa.edges.len()),
            predecessor,
            successor,
            kind,
            code: code.into(),
        });
        self.node_mut(predecessor).leaving.push(index);
        self.node_mut(successor).entering.push(index);
        index
    }

    /// # Panics
    /// If `id` is not a function entry.
    pub fn set_main_entry(&mut self, id: CfaNodeId) -> &mut Self {
        assert_eq!(
            self.node_mut(id).kind,
            CfaNodeKind::FunctionEntry,
            "main entry {id} must be a function entry"
        );
        self.cfa.main_entry = Some(id);
        self
    }

    pub fn build(self) -> Cfa {
        self.cfa
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// The nodes of [`counting_loop`], by role.
    pub(crate) struct CountingLoop {
        pub cfa: Cfa,
        pub main_entry: CfaNodeId,
        pub head: CfaNodeId,
        pub body: CfaNodeId,
        pub after: CfaNodeId,
        pub return_site: CfaNodeId,
        pub main_exit: CfaNodeId,
        pub f_entry: CfaNodeId,
        pub f_exit: CfaNodeId,
    }

    /// ```c
    /// int main() {
    ///   int i = 0;
    ///   while (i < 10) { i++; }
    ///   f();
    /// }
    /// void f() {}
    /// ```
    pub(crate) fn counting_loop() -> CountingLoop {
        let ids = UniqueIdGenerator::new();
        let mut b = CfaBuilder::new(&ids);
        let main_entry = b.add_node("main", CfaNodeKind::FunctionEntry);
        let decl = b.add_node("main", CfaNodeKind::Normal);
        let head = b.add_node("main", CfaNodeKind::Normal);
        let body = b.add_node("main", CfaNodeKind::Normal);
        let after = b.add_node("main", CfaNodeKind::Normal);
        let return_site = b.add_node("main", CfaNodeKind::Normal);
        let main_exit = b.add_node("main", CfaNodeKind::FunctionExit);
        let f_entry = b.add_node("f", CfaNodeKind::FunctionEntry);
        let f_exit = b.add_node("f", CfaNodeKind::FunctionExit);

        b.add_edge(main_entry, decl, CfaEdgeKind::Blank, "Function start dummy edge");
        b.add_edge(decl, head, CfaEdgeKind::Declaration, "int i = 0;");
        b.add_edge(head, body, CfaEdgeKind::Assume { truth: true }, "i < 10");
        b.add_edge(body, head, CfaEdgeKind::Statement, "i++;");
        b.add_edge(head, after, CfaEdgeKind::Assume { truth: false }, "i < 10");
        b.add_edge(after, f_entry, CfaEdgeKind::FunctionCall, "f();");
        b.add_edge(after, return_site, CfaEdgeKind::CallToReturn, "f();");
        b.add_edge(f_entry, f_exit, CfaEdgeKind::Blank, "");
        b.add_edge(f_exit, return_site, CfaEdgeKind::FunctionReturn, "Return edge from f to main");
        b.add_edge(return_site, main_exit, CfaEdgeKind::Blank, "");
        b.mark_loop_start(head).set_main_entry(main_entry);

        CountingLoop {
            cfa: b.build(),
            main_entry,
            head,
            body,
            after,
            return_site,
            main_exit,
            f_entry,
            f_exit,
        }
    }

    #[test]
    fn builder_wires_both_directions() {
        let p = counting_loop();
        let cfa = &p.cfa;
        assert_eq!(cfa.n_nodes(), 9);
        assert_eq!(cfa.n_edges(), 10);
        assert_eq!(cfa.main_entry(), Some(p.main_entry));

        let mut succ: Vec<_> = cfa.successors_of(p.head).collect();
        succ.sort();
        assert_eq!(succ, [p.body, p.after]);
        let mut pred: Vec<_> = cfa.predecessors_of(p.return_site).collect();
        pred.sort();
        assert_eq!(pred, [p.after, p.f_exit]);

        assert_eq!(cfa.function_entry("f"), Some(p.f_entry));
        assert_eq!(cfa.function_entries().count(), 2);
        assert!(cfa[p.head].is_loop_start);
        assert_eq!(cfa[p.main_exit].leaving_edges().len(), 0);
    }

    #[test]
    fn ids_come_from_the_shared_generator() {
        let ids = UniqueIdGenerator::new();
        ids.next_id();
        let mut b = CfaBuilder::new(&ids);
        let n = b.add_node("main", CfaNodeKind::Normal);
        assert_eq!(n, CfaNodeId(1));
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn edges_print_like_code() {
        let p = counting_loop();
        let lines: Vec<_> = p.cfa.leaving_edges(p.head).map(ToString::to_string).collect();
        insta::assert_snapshot!(lines.join("\n"), @r"
        N2 -{[i < 10]}-> N3
        N2 -{[!(i < 10)]}-> N4
        ");
    }

    #[test]
    #[should_panic(expected = "cannot have leaving edges")]
    fn termination_nodes_have_no_successors() {
        let ids = UniqueIdGenerator::new();
        let mut b = CfaBuilder::new(&ids);
        let end = b.add_node("main", CfaNodeKind::Termination);
        let other = b.add_node("main", CfaNodeKind::Normal);
        b.add_edge(end, other, CfaEdgeKind::Blank, "");
    }
}
