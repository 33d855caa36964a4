//! Graph sources: parsing the whitespace-separated CSV edge-list format,
//! a small built-in dataset registry, and the synthetic two-cycles builder
//! used by tests and benches.

use crate::error::{ErrorKind, RsmqlError, Span};
use crate::graph::Graph;

/// Parses a graph from `src dst label` whitespace-separated lines (blank
/// lines and `#`-prefixed lines are skipped).
pub fn parse_csv(source: &str) -> Result<Graph, RsmqlError> {
    let mut graph = Graph::new();
    for (lineno, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(src), Some(dst), Some(label), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(RsmqlError::new(
                ErrorKind::LoaderError(
                    format!("line {}", lineno + 1),
                    format!("expected `src dst label`, found `{line}`"),
                ),
                Span::default(),
            ));
        };
        let src: u32 = src.parse().map_err(|_| {
            RsmqlError::new(
                ErrorKind::LoaderError(
                    format!("line {}", lineno + 1),
                    format!("`{src}` is not a node id"),
                ),
                Span::default(),
            )
        })?;
        let dst: u32 = dst.parse().map_err(|_| {
            RsmqlError::new(
                ErrorKind::LoaderError(
                    format!("line {}", lineno + 1),
                    format!("`{dst}` is not a node id"),
                ),
                Span::default(),
            )
        })?;
        graph.add_edge(src, label, dst);
    }
    Ok(graph)
}

/// A named, pluggable graph source. `parse_csv` covers the file-based case;
/// implementations of this trait let `load(...)` resolve a bare dataset
/// name instead of a path.
pub trait GraphSource {
    /// Resolves `name` to a graph, or `None` if this source doesn't know it.
    fn resolve(&self, name: &str) -> Option<Graph>;
}

/// The small set of datasets available without a network fetch, standing
/// in for the external "generations" dataset (full dataset-name
/// resolution to a remote corpus is out of scope).
pub struct BuiltinDatasets;

impl GraphSource for BuiltinDatasets {
    fn resolve(&self, name: &str) -> Option<Graph> {
        match name {
            "generations" => Some(generations_stub()),
            "two_cycles" => Some(build_two_cycles(2, 2, ("a", "b"))),
            _ => None,
        }
    }
}

/// A minimal stand-in for the "generations" ontology dataset: a handful of
/// `type`/`subClassOf`-labeled edges, enough to exercise queries that name
/// that dataset without a network dependency.
fn generations_stub() -> Graph {
    let mut g = Graph::new();
    g.add_edge(0, "type", 1);
    g.add_edge(1, "subClassOf", 2);
    g.add_edge(2, "subClassOf", 3);
    g.add_edge(0, "hasParent", 4);
    g.add_edge(4, "hasParent", 5);
    g
}

/// Builds two labeled cycles sharing node 0: the first of length `n` with
/// edges labeled `labels.0`, the second of length `m` with edges labeled
/// `labels.1`. This is the canonical CFPQ benchmark shape used by the
/// integration tests and by `benches/cfpq.rs`.
pub fn build_two_cycles(n: u32, m: u32, labels: (&str, &str)) -> Graph {
    let mut g = Graph::new();
    g.add_node(0);
    let mut prev = 0;
    for i in 1..=n {
        g.add_edge(prev, labels.0, i);
        prev = i;
    }
    g.add_edge(prev, labels.0, 0);

    let mut prev = 0;
    for i in 1..=m {
        let node = n + i;
        g.add_edge(prev, labels.1, node);
        prev = node;
    }
    g.add_edge(prev, labels.1, 0);
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_separated_edges() {
        let g = parse_csv("0 1 a\n1 2 b\n").unwrap();
        assert_eq!(g.edges().count(), 2);
    }

    #[test]
    fn rejects_malformed_lines() {
        let err = parse_csv("0 a").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::LoaderError(..)));
    }

    #[test]
    fn two_cycles_share_node_zero() {
        let g = build_two_cycles(2, 3, ("a", "b"));
        assert_eq!(g.node_count(), 1 + 2 + 3);
        let a_edges = g.edges().filter(|(_, l, _)| l == "a").count();
        let b_edges = g.edges().filter(|(_, l, _)| l == "b").count();
        assert_eq!(a_edges, 3);
        assert_eq!(b_edges, 4);
    }

    #[test]
    fn builtin_datasets_resolve_known_names() {
        let datasets = BuiltinDatasets;
        assert!(datasets.resolve("generations").is_some());
        assert!(datasets.resolve("nonexistent").is_none());
    }
}
