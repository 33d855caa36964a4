//! Recursive state machines: a start nonterminal plus a box (an [`Fa`]) per
//! nonterminal, whose alphabet may itself reference other nonterminals.

use std::cell::Cell;

use ahash::AHashMap;

use crate::fa::{BoolMatrix, Fa, Symbol};

/// A recursive state machine: a named collection of boxes, one designated
/// the start box.
#[derive(Debug, Clone)]
pub struct Rsm {
    start: String,
    boxes: AHashMap<String, Fa>,
}

thread_local! {
    static FRESH_NONTERMINAL: Cell<u32> = const { Cell::new(0) };
}

fn fresh_nonterminal(prefix: &str) -> String {
    FRESH_NONTERMINAL.with(|c| {
        let n = c.get();
        c.set(n + 1);
        format!("{prefix}#{n}")
    })
}

impl Rsm {
    /// Builds an RSM from its start nonterminal and box map. Panics if
    /// `start` is not a key of `boxes`; callers (the ECFG compiler) are
    /// expected to have validated this already.
    pub fn new(start: impl Into<String>, boxes: AHashMap<String, Fa>) -> Self {
        let start = start.into();
        assert!(
            boxes.contains_key(&start),
            "RSM start nonterminal must have a box"
        );
        Self { start, boxes }
    }

    /// Wraps a plain FA as a single-box RSM, the target of the implicit
    /// FA-to-RSM lift used when an FA operand meets an RSM operand in `+`,
    /// `|`, or unary `*`.
    pub fn from_fa(fa: &Fa) -> Self {
        let name = fresh_nonterminal("Box");
        let mut boxes = AHashMap::default();
        boxes.insert(name.clone(), fa.clone());
        Rsm::new(name, boxes)
    }

    /// The start nonterminal's name.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// The box for a given nonterminal, if any.
    pub fn box_for(&self, nonterminal: &str) -> Option<&Fa> {
        self.boxes.get(nonterminal)
    }

    /// All nonterminals with a box.
    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.boxes.keys().map(|s| s.as_str())
    }

    fn merged_boxes(a: &Rsm, b: &Rsm) -> AHashMap<String, Fa> {
        let mut boxes = a.boxes.clone();
        boxes.extend(b.boxes.iter().map(|(k, v)| (k.clone(), v.clone())));
        boxes
    }

    /// Builds the RSM accepting `L(a) . L(b)`: a fresh start box
    /// concatenating references to `a`'s and `b`'s start nonterminals,
    /// adjoined to the union of both operands' boxes.
    pub fn concat(a: &Rsm, b: &Rsm) -> Rsm {
        let mut boxes = Rsm::merged_boxes(a, b);
        let start = fresh_nonterminal("Cat");
        let ref_a = Fa::singleton(Symbol::Nonterminal(a.start.clone()));
        let ref_b = Fa::singleton(Symbol::Nonterminal(b.start.clone()));
        boxes.insert(start.clone(), Fa::concat(&ref_a, &ref_b));
        Rsm::new(start, boxes)
    }

    /// Builds the RSM accepting `L(a) union L(b)`, by the same construction
    /// as [`Rsm::concat`].
    pub fn union(a: &Rsm, b: &Rsm) -> Rsm {
        let mut boxes = Rsm::merged_boxes(a, b);
        let start = fresh_nonterminal("Alt");
        let ref_a = Fa::singleton(Symbol::Nonterminal(a.start.clone()));
        let ref_b = Fa::singleton(Symbol::Nonterminal(b.start.clone()));
        boxes.insert(start.clone(), Fa::union(&ref_a, &ref_b));
        Rsm::new(start, boxes)
    }

    /// Builds the RSM accepting `L(a)*`.
    pub fn star(a: &Rsm) -> Rsm {
        let mut boxes = a.boxes.clone();
        let start = fresh_nonterminal("Star");
        let ref_a = Fa::singleton(Symbol::Nonterminal(a.start.clone()));
        boxes.insert(start.clone(), Fa::kleene_star(&ref_a));
        Rsm::new(start, boxes)
    }

    /// Intersects this RSM with a graph-lifted FA: one
    /// boolean `g x g` matrix `B[N]` per nonterminal (`g = fa.num_states()`),
    /// seeded with the identity where `N`'s box accepts epsilon, then closed
    /// under `B[N] |= project(TC(sum_l kron(box_N.M_l, B[l])))` where `l`
    /// ranges over both terminal labels (read from `fa`, constant across the
    /// fixed point) and nonterminal names (read from the current `B`), until
    /// no `B[N]` gains a cell.
    ///
    /// Returns the per-nonterminal `B[N]` matrices; [`Rsm::start_relation`]
    /// extracts the FA the CFPQ consumers actually want.
    pub fn intersect_with_fa(&self, fa: &Fa) -> AHashMap<String, BoolMatrix> {
        self.intersect_with_fa_capped(fa, None)
    }

    /// As [`Rsm::intersect_with_fa`], but bounds both the inner transitive
    /// closures and the outer fixed-point loop by `cap` rounds, guarding
    /// against non-termination on a pathological RSM/graph pairing. `None`
    /// is unbounded.
    pub fn intersect_with_fa_capped(&self, fa: &Fa, cap: Option<u32>) -> AHashMap<String, BoolMatrix> {
        let g = fa.num_states();
        let mut b: AHashMap<String, BoolMatrix> = self
            .boxes
            .keys()
            .map(|nt| (nt.clone(), BoolMatrix::zero(g)))
            .collect();
        for (nt, fa_n) in &self.boxes {
            if box_accepts_epsilon(fa_n) {
                let m = b.get_mut(nt).unwrap();
                for i in 0..g {
                    m.set(i, i);
                }
            }
        }

        let mut iterations = 0u64;
        loop {
            iterations += 1;
            let mut changed = false;
            for (nt, fa_n) in &self.boxes {
                let m_n = fa_n.num_states();
                let mut t = BoolMatrix::zero(m_n * g);
                for sym in fa_n.alphabet() {
                    let bl = match sym {
                        Symbol::Terminal(label) => fa.matrix_for(&Symbol::Terminal(label.clone())),
                        Symbol::Nonterminal(other) => b.get(other),
                    };
                    let Some(bl) = bl else { continue };
                    let box_m = fa_n.matrix_for(sym).expect("alphabet() only yields present symbols");
                    t.union_with(&box_m.kron(bl));
                }
                let closure = t.transitive_closure_capped(cap);
                let entry = b.get_mut(nt).unwrap();
                let before = entry.nnz();
                for &q in fa_n.start_states() {
                    for &q2 in fa_n.final_states() {
                        for u in 0..g {
                            for u2 in closure.row_ones(q * g + u) {
                                if u2 / g == q2 {
                                    entry.set(u, u2 % g);
                                }
                            }
                        }
                    }
                }
                if entry.nnz() != before {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            if cap.is_some_and(|c| iterations >= c as u64) {
                log::warn!("rsm-fa intersect hit the {iterations}-round cap before a fixed point");
                break;
            }
        }
        log::trace!("rsm-fa intersect: {iterations} fixed-point rounds");

        b
    }

    /// Builds the FA over `fa`'s own states whose edges are exactly the
    /// nonzeros of `relation[self.start()]`, with start/final states
    /// propagated from `fa`, once the fixed point has settled.
    pub fn start_relation(&self, fa: &Fa, relation: &AHashMap<String, BoolMatrix>) -> Fa {
        let m = &relation[&self.start];
        Fa::from_adjacency(m, fa.start_states().clone(), fa.final_states().clone())
    }
}

/// Whether some start state reaches some final state via epsilon
/// transitions alone (the NFA accepts the empty word), used to seed
/// `B[N]` with the identity for nonterminals whose box is nullable.
fn box_accepts_epsilon(fa: &Fa) -> bool {
    let closure = fa.epsilon_closure_matrix();
    fa.start_states()
        .iter()
        .any(|&s| fa.final_states().contains(&s) || closure.row_ones(s).any(|t| fa.final_states().contains(&t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::Symbol;
    use crate::graph::Graph;

    fn single_box_rsm() -> Rsm {
        let mut boxes = AHashMap::default();
        boxes.insert("S".to_string(), Fa::singleton(Symbol::terminal("a")));
        Rsm::new("S", boxes)
    }

    #[test]
    fn start_box_is_queryable() {
        let rsm = single_box_rsm();
        assert_eq!(rsm.start(), "S");
        assert!(rsm.box_for("S").is_some());
        assert!(rsm.box_for("T").is_none());
    }

    #[test]
    fn intersect_with_fa_finds_single_edge() {
        let rsm = single_box_rsm();
        let mut g = Graph::new();
        g.add_edge(0, "a", 1);
        let graph_fa = Fa::from_graph(&g, None, None);
        let relation = rsm.intersect_with_fa(&graph_fa);
        let b = &relation["S"];
        assert_eq!(b.nnz(), 1);
        let result = rsm.start_relation(&graph_fa, &relation);
        assert_eq!(result.num_states(), graph_fa.num_states());
    }

    #[test]
    fn capped_intersect_agrees_with_unbounded_when_cap_is_generous() {
        let rsm = single_box_rsm();
        let mut g = Graph::new();
        g.add_edge(0, "a", 1);
        let graph_fa = Fa::from_graph(&g, None, None);
        let uncapped = rsm.intersect_with_fa(&graph_fa);
        let capped = rsm.intersect_with_fa_capped(&graph_fa, Some(1_000));
        assert_eq!(uncapped["S"].nnz(), capped["S"].nnz());
    }

    #[test]
    fn star_grammar_matches_balanced_cycle() {
        // S -> a S b | epsilon, encoded directly as RSM boxes.
        let mut boxes = AHashMap::default();
        let tail = Fa::concat(
            &Fa::singleton(Symbol::Nonterminal("S".to_string())),
            &Fa::singleton(Symbol::terminal("b")),
        );
        let body = Fa::union(&Fa::concat(&Fa::singleton(Symbol::terminal("a")), &tail), &Fa::epsilon());
        boxes.insert("S".to_string(), body);
        let rsm = Rsm::new("S", boxes);

        let graph = crate::loader::build_two_cycles(1, 1, ("a", "b"));
        let fa = Fa::from_graph(&graph, None, None);
        let relation = rsm.intersect_with_fa(&fa);
        let b = &relation["S"];
        assert!(b.nnz() > 0);
    }
}
