//! Context-free path querying solvers: Hellings' worklist
//! algorithm and a matrix-fixed-point algorithm, plus the `cfpq_*` wrappers
//! that filter a solver's output by start/final nodes and nonterminal.

use ahash::{AHashMap, AHashSet};
use log::{debug, trace};

use crate::cfg::{Cfg, CfgSymbol};
use crate::config::{CfpqSolver, InternalConfig};
use crate::graph::{Graph, NodeId};

/// A solved CFPQ relation: for each nonterminal, the set of `(from, to)`
/// node pairs it derives a path between.
pub type CfpqResult = AHashMap<String, AHashSet<(NodeId, NodeId)>>;

/// Hellings' algorithm: seed a worklist with the WCNF grammar's terminal
/// and epsilon productions applied to the graph, then repeatedly pop a
/// triple and apply every binary production it could complete.
pub fn hellings(cfg: &Cfg, graph: &Graph) -> CfpqResult {
    let wcnf = cfg.to_wcnf();
    let mut relation: CfpqResult = AHashMap::default();
    let mut worklist: Vec<(String, NodeId, NodeId)> = Vec::new();

    let mut insert = |relation: &mut CfpqResult,
                       worklist: &mut Vec<(String, NodeId, NodeId)>,
                       nt: &str,
                       from: NodeId,
                       to: NodeId| {
        let set = relation.entry(nt.to_string()).or_default();
        if set.insert((from, to)) {
            worklist.push((nt.to_string(), from, to));
        }
    };

    for node in graph.nodes() {
        for p in &wcnf.productions {
            if p.body.is_empty() {
                insert(&mut relation, &mut worklist, &p.lhs, node, node);
            }
        }
    }
    for (from, label, to) in graph.edges() {
        for p in &wcnf.productions {
            if let [CfgSymbol::Terminal(t)] = p.body.as_slice() {
                if t == label {
                    insert(&mut relation, &mut worklist, &p.lhs, *from, *to);
                }
            }
        }
    }

    // Index binary productions by each of their two RHS nonterminals for
    // fast lookup when a worklist triple could extend them on either side.
    let mut by_left: AHashMap<&str, Vec<&crate::cfg::Production>> = AHashMap::default();
    let mut by_right: AHashMap<&str, Vec<&crate::cfg::Production>> = AHashMap::default();
    for p in &wcnf.productions {
        if let [CfgSymbol::Nonterminal(l), CfgSymbol::Nonterminal(r)] = p.body.as_slice() {
            by_left.entry(l.as_str()).or_default().push(p);
            by_right.entry(r.as_str()).or_default().push(p);
        }
    }

    let mut iterations = 0u64;
    while let Some((nt, from, to)) = worklist.pop() {
        iterations += 1;
        if let Some(prods) = by_left.get(nt.as_str()) {
            let rights: Vec<(String, NodeId, NodeId)> = relation
                .iter()
                .flat_map(|(rnt, pairs)| pairs.iter().map(move |&(f, t)| (rnt.clone(), f, t)))
                .filter(|(_, f, _)| *f == to)
                .collect();
            for p in prods {
                if let CfgSymbol::Nonterminal(r) = &p.body[1] {
                    for (rnt, f, t) in &rights {
                        if rnt == r && *f == to {
                            insert(&mut relation, &mut worklist, &p.lhs, from, *t);
                        }
                    }
                }
            }
        }
        if let Some(prods) = by_right.get(nt.as_str()) {
            let lefts: Vec<(String, NodeId, NodeId)> = relation
                .iter()
                .flat_map(|(lnt, pairs)| pairs.iter().map(move |&(f, t)| (lnt.clone(), f, t)))
                .filter(|(_, _, t)| *t == from)
                .collect();
            for p in prods {
                if let CfgSymbol::Nonterminal(l) = &p.body[0] {
                    for (lnt, f, t) in &lefts {
                        if lnt == l && *t == from {
                            insert(&mut relation, &mut worklist, &p.lhs, f, to);
                        }
                    }
                }
            }
        }
    }
    trace!("hellings: {iterations} worklist iterations");

    relation
}

/// The matrix-fixed-point algorithm: one boolean adjacency matrix per
/// nonterminal, seeded from terminal/epsilon productions, then closed
/// under every binary production's matrix product until no matrix grows.
pub fn matrix(cfg: &Cfg, graph: &Graph) -> CfpqResult {
    let wcnf = cfg.to_wcnf();
    let nodes: Vec<NodeId> = graph.nodes().collect();
    let index: AHashMap<NodeId, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let n = nodes.len();

    let mut matrices: AHashMap<String, crate::fa::BoolMatrix> = AHashMap::default();
    for nt in wcnf.all_nonterminals() {
        matrices.insert(nt, crate::fa::BoolMatrix::zero(n));
    }

    for node in 0..n {
        for p in &wcnf.productions {
            if p.body.is_empty() {
                matrices.get_mut(&p.lhs).unwrap().set(node, node);
            }
        }
    }
    for (from, label, to) in graph.edges() {
        let (i, j) = (index[from], index[to]);
        for p in &wcnf.productions {
            if let [CfgSymbol::Terminal(t)] = p.body.as_slice() {
                if t == label {
                    matrices.get_mut(&p.lhs).unwrap().set(i, j);
                }
            }
        }
    }

    let binary: Vec<(&str, &str, &str)> = wcnf
        .productions
        .iter()
        .filter_map(|p| match p.body.as_slice() {
            [CfgSymbol::Nonterminal(l), CfgSymbol::Nonterminal(r)] => {
                Some((p.lhs.as_str(), l.as_str(), r.as_str()))
            }
            _ => None,
        })
        .collect();

    let mut iterations = 0u64;
    loop {
        iterations += 1;
        let mut total_before = 0;
        let mut total_after = 0;
        let mut updates: Vec<(String, crate::fa::BoolMatrix)> = Vec::new();
        for &(lhs, l, r) in &binary {
            let product = matrices[l].mul(&matrices[r]);
            let mut merged = matrices[lhs].clone();
            total_before += merged.nnz();
            merged.union_with(&product);
            total_after += merged.nnz();
            updates.push((lhs.to_string(), merged));
        }
        for (lhs, m) in updates {
            matrices.insert(lhs, m);
        }
        if total_after == total_before {
            break;
        }
    }
    trace!("matrix: {iterations} fixed-point iterations");

    matrices
        .into_iter()
        .map(|(nt, m)| {
            let mut pairs = AHashSet::default();
            for i in 0..n {
                for j in m.row_ones(i) {
                    pairs.insert((nodes[i], nodes[j]));
                }
            }
            (nt, pairs)
        })
        .collect()
}

/// Solves with whichever solver `config.default_solver()` names, for
/// embedders that want the configured default rather than picking a solver
/// explicitly (the `cfpq_hellings`/`cfpq_matrix` builtins still let a GQL
/// program name one directly).
pub fn solve_with_config(cfg: &Cfg, graph: &Graph, config: &InternalConfig) -> CfpqResult {
    let solver = config.default_solver();
    debug!("cfpq: solving with the configured default solver ({solver})");
    match solver {
        CfpqSolver::Hellings => hellings(cfg, graph),
        CfpqSolver::Matrix => matrix(cfg, graph),
    }
}

/// Filters a solved relation to the pairs whose `from` is in `start_nodes`
/// (or all nodes, if `None`), `to` is in `final_nodes` (or all nodes), and
/// whose nonterminal is `nonterminal`.
pub fn cfpq_filter(
    result: &CfpqResult,
    nonterminal: &str,
    start_nodes: Option<&AHashSet<NodeId>>,
    final_nodes: Option<&AHashSet<NodeId>>,
) -> AHashSet<(NodeId, NodeId)> {
    result
        .get(nonterminal)
        .into_iter()
        .flat_map(|pairs| pairs.iter().copied())
        .filter(|(from, to)| {
            start_nodes.map(|s| s.contains(from)).unwrap_or(true)
                && final_nodes.map(|s| s.contains(to)).unwrap_or(true)
        })
        .collect()
}

/// Convenience wrapper: solves with Hellings' algorithm and filters in one
/// call, the shape `interpreter.rs` exposes as the `cfpq` builtin.
pub fn cfpq_hellings(
    cfg: &Cfg,
    graph: &Graph,
    nonterminal: &str,
    start_nodes: Option<&AHashSet<NodeId>>,
    final_nodes: Option<&AHashSet<NodeId>>,
) -> AHashSet<(NodeId, NodeId)> {
    let result = hellings(cfg, graph);
    cfpq_filter(&result, nonterminal, start_nodes, final_nodes)
}

/// As [`cfpq_hellings`], but using the matrix-fixed-point solver.
pub fn cfpq_matrix(
    cfg: &Cfg,
    graph: &Graph,
    nonterminal: &str,
    start_nodes: Option<&AHashSet<NodeId>>,
    final_nodes: Option<&AHashSet<NodeId>>,
) -> AHashSet<(NodeId, NodeId)> {
    let result = matrix(cfg, graph);
    cfpq_filter(&result, nonterminal, start_nodes, final_nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::Production;
    use crate::loader::build_two_cycles;

    fn dyck_like_grammar() -> Cfg {
        // S -> a S b | epsilon : balanced a/b paths.
        Cfg::new(
            "S",
            vec![
                Production {
                    lhs: "S".to_string(),
                    body: vec![
                        CfgSymbol::Terminal("a".to_string()),
                        CfgSymbol::Nonterminal("S1".to_string()),
                    ],
                },
                Production {
                    lhs: "S1".to_string(),
                    body: vec![
                        CfgSymbol::Nonterminal("S".to_string()),
                        CfgSymbol::Nonterminal("B".to_string()),
                    ],
                },
                Production {
                    lhs: "B".to_string(),
                    body: vec![CfgSymbol::Terminal("b".to_string())],
                },
                Production {
                    lhs: "S".to_string(),
                    body: vec![],
                },
            ],
        )
    }

    #[test]
    fn hellings_and_matrix_agree_on_two_cycles() {
        let cfg = dyck_like_grammar();
        let graph = build_two_cycles(2, 2, ("a", "b"));
        let h = hellings(&cfg, &graph);
        let m = matrix(&cfg, &graph);
        let h_pairs = h.get("S").cloned().unwrap_or_default();
        let m_pairs = m.get("S").cloned().unwrap_or_default();
        assert_eq!(h_pairs, m_pairs);
    }

    #[test]
    fn solve_with_config_honors_the_configured_solver() {
        use crate::config::{Config, InternalConfig};

        let cfg = dyck_like_grammar();
        let graph = build_two_cycles(2, 2, ("a", "b"));

        let hellings_config = InternalConfig::new(Config {
            default_solver: CfpqSolver::Hellings,
            ..Config::default()
        })
        .unwrap();
        let matrix_config = InternalConfig::new(Config {
            default_solver: CfpqSolver::Matrix,
            ..Config::default()
        })
        .unwrap();

        let via_hellings = solve_with_config(&cfg, &graph, &hellings_config);
        let via_matrix = solve_with_config(&cfg, &graph, &matrix_config);
        assert_eq!(
            via_hellings.get("S").cloned().unwrap_or_default(),
            via_matrix.get("S").cloned().unwrap_or_default()
        );
    }

    #[test]
    fn filter_restricts_to_requested_endpoints() {
        let cfg = dyck_like_grammar();
        let graph = build_two_cycles(1, 1, ("a", "b"));
        let result = hellings(&cfg, &graph);
        let start: AHashSet<NodeId> = [0].into_iter().collect();
        let filtered = cfpq_filter(&result, "S", Some(&start), None);
        assert!(filtered.iter().all(|(f, _)| *f == 0));
    }
}
