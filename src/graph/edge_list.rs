//! Plain-text edge lists.
//!
//! ```text
//! # comment
//! entry -> loop -> exit
//! loop -> loop
//! isolated
//! ```
//!
//! Every line is either a chain `a -> b -> ..` or a lone node name. Node names
//! are whitespace-free tokens; nodes are created in order of first appearance,
//! which makes the resulting node order, and therefore every algorithm run on
//! it, reproducible.

use std::{fmt::Write, io::BufRead};

use ahash::AHashMap;
use itertools::Itertools;
use thiserror::Error;

use super::{DiGraph, NodeIndex};

#[derive(Debug, Error)]
pub enum EdgeListError {
    #[error("line {line}: empty node name in {content:?}")]
    EmptyNode { line: usize, content: String },
    #[error("line {line}: node name {name:?} contains whitespace")]
    InvalidNode { line: usize, name: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Default)]
struct EdgeListBuilder {
    graph: DiGraph<String>,
    by_name: AHashMap<String, NodeIndex>,
}

impl EdgeListBuilder {
    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(idx) = self.by_name.get(name) {
            return *idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    fn line(&mut self, line_no: usize, line: &str) -> Result<(), EdgeListError> {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            return Ok(());
        }

        let mut chain = Vec::new();
        for name in content.split("->").map(str::trim) {
            if name.is_empty() {
                return Err(EdgeListError::EmptyNode {
                    line: line_no,
                    content: content.to_string(),
                });
            }
            if name.contains(char::is_whitespace) {
                return Err(EdgeListError::InvalidNode {
                    line: line_no,
                    name: name.to_string(),
                });
            }
            chain.push(self.node(name));
        }

        for (from, to) in chain.into_iter().tuple_windows() {
            self.graph.add_edge(from, to);
        }
        Ok(())
    }
}

pub fn parse_edge_list(input: &str) -> Result<DiGraph<String>, EdgeListError> {
    let mut builder = EdgeListBuilder::default();
    for (i, line) in input.lines().enumerate() {
        builder.line(i + 1, line)?;
    }
    Ok(builder.graph)
}

pub fn read_edge_list(reader: impl BufRead) -> Result<DiGraph<String>, EdgeListError> {
    let mut builder = EdgeListBuilder::default();
    for (i, line) in reader.lines().enumerate() {
        builder.line(i + 1, &line?)?;
    }
    Ok(builder.graph)
}

/// Writes `graph` back out: every node on its own line, then one line per edge.
pub fn write_edge_list(graph: &DiGraph<String>, writer: &mut impl Write) -> std::fmt::Result {
    for (_, name) in graph.iter_nodes() {
        writeln!(writer, "{name}")?;
    }
    for (from, to) in graph.iter_edges() {
        writeln!(writer, "{} -> {}", graph[from], graph[to])?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn chains_comments_and_isolated_nodes() {
        let graph = parse_edge_list(
            "# header
             a -> b -> c   # trailing
             c -> a

             d",
        )
        .unwrap();
        assert_eq!(graph.n_nodes(), 4);
        assert_eq!(graph.n_edges(), 3);
        let names: Vec<_> = graph.iter_nodes().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let graph = parse_edge_list("a -> b\na -> b").unwrap();
        assert_eq!(graph.n_edges(), 1);
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_edge_list("a -> b\na -> -> c").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r#"line 2: empty node name in "a -> -> c""#);

        let err = parse_edge_list("a b -> c").unwrap_err();
        assert!(matches!(err, EdgeListError::InvalidNode { line: 1, .. }));
    }

    #[test]
    fn round_trip_through_text() {
        let graph = parse_edge_list("x -> y -> x\nz").unwrap();
        let mut out = String::new();
        write_edge_list(&graph, &mut out).unwrap();
        similar_asserts::assert_eq!(out, "x\ny\nz\nx -> y\ny -> x\n");
        assert_eq!(parse_edge_list(&out).unwrap(), graph);
    }

    #[test]
    fn reads_from_buffered_input() {
        let graph = read_edge_list(std::io::Cursor::new("p -> q\n")).unwrap();
        assert_eq!(graph.n_edges(), 1);
    }
}
