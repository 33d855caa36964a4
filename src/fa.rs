//! Nondeterministic finite automata over boolean adjacency matrices, and the
//! algebra over them.
//!
//! States are canonicalized to a dense `0..n` index range for every
//! algorithmic operation; the original, possibly-structured identity of each
//! state (a graph node, a Kronecker pair, ...) is kept alongside in
//! [`StateLabel`] so combinators like [`Fa::intersect`] can be inspected
//! without losing which states came from where.

use ahash::{AHashMap, AHashSet};
use fixedbitset_stack::FixedBitSet;

use crate::graph::{Graph, NodeId};

/// A symbol in an FA's input alphabet: either a terminal label or, for FAs
/// that are boxes of an [`crate::rsm::Rsm`], a reference to another box.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// A terminal edge label.
    Terminal(String),
    /// A reference to another RSM box.
    Nonterminal(String),
}

impl Symbol {
    /// Convenience constructor for a terminal symbol.
    pub fn terminal(s: impl Into<String>) -> Self {
        Symbol::Terminal(s.into())
    }
}

/// The opaque identity of a state, preserved through algebraic combinators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateLabel {
    /// A state synthesized by a combinator (Thompson construction, subset
    /// construction, ...); the number is only unique within its own FA.
    Fresh(u32),
    /// A state lifted directly from a graph node.
    Node(NodeId),
    /// A state produced by [`Fa::intersect`]: a pair of the operands' states.
    Pair(Box<StateLabel>, Box<StateLabel>),
}

/// A dense `n x n` boolean matrix, backed by one [`FixedBitSet`] row per
/// source state.
#[derive(Debug, Clone)]
pub struct BoolMatrix {
    n: usize,
    rows: Vec<FixedBitSet>,
}

impl BoolMatrix {
    /// The `n x n` all-zero matrix.
    pub fn zero(n: usize) -> Self {
        Self {
            n,
            rows: (0..n).map(|_| FixedBitSet::with_capacity(n)).collect(),
        }
    }

    /// The dimension of the (square) matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Whether `M[i][j]` is set.
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.rows[i].contains(j)
    }

    /// Sets `M[i][j]`.
    pub fn set(&mut self, i: usize, j: usize) {
        self.rows[i].insert(j);
    }

    /// The column indices with a set bit in row `i`.
    pub fn row_ones(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows[i].ones()
    }

    /// The number of set bits.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.count_ones(..)).sum()
    }

    /// In-place `self |= other`.
    pub fn union_with(&mut self, other: &BoolMatrix) {
        for (r, o) in self.rows.iter_mut().zip(other.rows.iter()) {
            r.union_with(o);
        }
    }

    /// Boolean matrix product `self * other` (`result[i][k] = OR_j
    /// self[i][j] & other[j][k]`).
    pub fn mul(&self, other: &BoolMatrix) -> BoolMatrix {
        debug_assert_eq!(self.n, other.n);
        let mut result = BoolMatrix::zero(self.n);
        for i in 0..self.n {
            for j in self.rows[i].ones() {
                result.rows[i].union_with(&other.rows[j]);
            }
        }
        result
    }

    /// The non-reflexive transitive closure `M+ = OR_{k>=1} M^k`, computed
    /// by repeated squaring until the number of set bits stabilizes.
    pub fn transitive_closure(&self) -> BoolMatrix {
        self.transitive_closure_capped(None)
    }

    /// As [`BoolMatrix::transitive_closure`], but gives up after `cap`
    /// squaring rounds instead of running unbounded on pathological input.
    /// `None` is unbounded. Returns whatever partial closure has accumulated
    /// so far if the cap is hit, logging a warning since the result is then
    /// a lower bound rather than the true closure.
    pub fn transitive_closure_capped(&self, cap: Option<u32>) -> BoolMatrix {
        let mut m = self.clone();
        let mut rounds: u32 = 0;
        loop {
            let before = m.nnz();
            let squared = m.mul(&m);
            m.union_with(&squared);
            if m.nnz() == before {
                break;
            }
            rounds += 1;
            if cap.is_some_and(|c| rounds >= c) {
                log::warn!("transitive closure hit the {rounds}-round cap before stabilizing");
                break;
            }
        }
        m
    }

    /// The Kronecker (tensor) product: a `(n*m) x (n*m)` matrix where state
    /// `(i, j)` maps to row/column `i * m.n + j`.
    pub fn kron(&self, other: &BoolMatrix) -> BoolMatrix {
        let mut result = BoolMatrix::zero(self.n * other.n);
        for i in 0..self.n {
            for ii in self.rows[i].ones() {
                for j in 0..other.n {
                    for jj in other.rows[j].ones() {
                        result.set(i * other.n + j, ii * other.n + jj);
                    }
                }
            }
        }
        result
    }
}

/// A nondeterministic finite automaton with epsilon-transitions, represented
/// as one boolean adjacency matrix per label plus an epsilon matrix.
#[derive(Debug, Clone)]
pub struct Fa {
    states: Vec<StateLabel>,
    start: AHashSet<usize>,
    finals: AHashSet<usize>,
    epsilon: BoolMatrix,
    by_symbol: AHashMap<Symbol, BoolMatrix>,
}

impl Fa {
    fn empty(n: usize) -> Self {
        Self {
            states: Vec::with_capacity(n),
            start: AHashSet::default(),
            finals: AHashSet::default(),
            epsilon: BoolMatrix::zero(n),
            by_symbol: AHashMap::default(),
        }
    }

    /// The number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// The opaque label of state `i`.
    pub fn state_label(&self, i: usize) -> &StateLabel {
        &self.states[i]
    }

    /// The start state indices.
    pub fn start_states(&self) -> &AHashSet<usize> {
        &self.start
    }

    /// The final state indices.
    pub fn final_states(&self) -> &AHashSet<usize> {
        &self.finals
    }

    /// The distinct non-epsilon symbols used by some transition.
    pub fn alphabet(&self) -> impl Iterator<Item = &Symbol> {
        self.by_symbol.keys()
    }

    /// The boolean matrix for `symbol`, if any transition uses it.
    pub fn matrix_for(&self, symbol: &Symbol) -> Option<&BoolMatrix> {
        self.by_symbol.get(symbol)
    }

    /// The FA accepting exactly the empty string.
    pub fn epsilon() -> Self {
        let mut fa = Fa::empty(1);
        fa.states.push(StateLabel::Fresh(0));
        fa.start.insert(0);
        fa.finals.insert(0);
        fa
    }

    /// The singleton FA accepting exactly the one-symbol string `sym`: the
    /// coercion target for implicit string-to-FA lifting.
    pub fn singleton(sym: Symbol) -> Self {
        let mut fa = Fa::empty(2);
        fa.states.push(StateLabel::Fresh(0));
        fa.states.push(StateLabel::Fresh(1));
        fa.epsilon = BoolMatrix::zero(2);
        fa.start.insert(0);
        fa.finals.insert(1);
        let mut m = BoolMatrix::zero(2);
        m.set(0, 1);
        fa.by_symbol.insert(sym, m);
        fa
    }

    /// Lifts a labeled multigraph to an NFA. If `start`/`final_states` are
    /// `None`, every node is both a start and a final state.
    pub fn from_graph(
        graph: &Graph,
        start: Option<&AHashSet<NodeId>>,
        final_states: Option<&AHashSet<NodeId>>,
    ) -> Self {
        let nodes: Vec<NodeId> = graph.nodes().collect();
        let index: AHashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let n = nodes.len();
        let mut fa = Fa::empty(n);
        fa.states = nodes.iter().map(|&n| StateLabel::Node(n)).collect();
        for (i, &node) in nodes.iter().enumerate() {
            let is_start = start.map(|s| s.contains(&node)).unwrap_or(true);
            let is_final = final_states.map(|s| s.contains(&node)).unwrap_or(true);
            if is_start {
                fa.start.insert(i);
            }
            if is_final {
                fa.finals.insert(i);
            }
        }
        for (from, label, to) in graph.edges() {
            let sym = Symbol::Terminal(label.clone());
            let m = fa
                .by_symbol
                .entry(sym)
                .or_insert_with(|| BoolMatrix::zero(n));
            m.set(index[from], index[to]);
        }
        fa
    }

    /// Builds an FA whose states are `Fresh(0..n)` (`n = adjacency.dim()`)
    /// and whose sole transitions are `adjacency`'s nonzeros, treated as
    /// epsilon edges (a precomputed reachability relation, not single-label
    /// steps). Used to present an [`crate::rsm::Rsm`] box-closure matrix as
    /// a plain FA for the `of`/`with` accessors and builders.
    pub fn from_adjacency(
        adjacency: &BoolMatrix,
        start: AHashSet<usize>,
        finals: AHashSet<usize>,
    ) -> Self {
        let n = adjacency.dim();
        let mut fa = Fa::empty(n);
        fa.states = (0..n).map(|i| StateLabel::Fresh(i as u32)).collect();
        fa.epsilon = adjacency.clone();
        fa.start = start;
        fa.finals = finals;
        fa
    }

    /// The non-reflexive transitive closure of the epsilon matrix alone
    /// (excludes labeled transitions), used to test emptiness acceptance.
    pub fn epsilon_closure_matrix(&self) -> BoolMatrix {
        self.epsilon.transitive_closure()
    }

    /// The union of all per-label matrices plus the epsilon matrix.
    pub fn adjacency_matrix(&self) -> BoolMatrix {
        let mut m = self.epsilon.clone();
        for mat in self.by_symbol.values() {
            m.union_with(mat);
        }
        m
    }

    fn epsilon_closure(&self, from: &AHashSet<usize>) -> AHashSet<usize> {
        let closure = self.epsilon.transitive_closure();
        let mut result = from.clone();
        for &s in from {
            result.extend(closure.row_ones(s));
        }
        result
    }

    /// Thompson construction: `L(union(a, b)) = L(a) union L(b)`.
    pub fn union(a: &Fa, b: &Fa) -> Fa {
        let offset_a = 1;
        let offset_b = offset_a + a.num_states();
        let n = offset_b + b.num_states() + 1;
        let mut fa = Fa::empty(n);
        fa.states.push(StateLabel::Fresh(0));
        fa.states.extend(a.states.iter().cloned());
        fa.states.extend(b.states.iter().cloned());
        fa.states.push(StateLabel::Fresh(n as u32 - 1));

        let new_start = 0;
        let new_final = n - 1;
        fa.start.insert(new_start);
        fa.finals.insert(new_final);

        graft(&mut fa, a, offset_a);
        graft(&mut fa, b, offset_b);

        for &s in &a.start {
            fa.epsilon.set(new_start, s + offset_a);
        }
        for &s in &b.start {
            fa.epsilon.set(new_start, s + offset_b);
        }
        for &f in &a.finals {
            fa.epsilon.set(f + offset_a, new_final);
        }
        for &f in &b.finals {
            fa.epsilon.set(f + offset_b, new_final);
        }
        fa
    }

    /// Thompson construction: `L(concat(a, b)) = L(a) . L(b)`.
    pub fn concat(a: &Fa, b: &Fa) -> Fa {
        let offset_a = 0;
        let offset_b = a.num_states();
        let n = offset_b + b.num_states();
        let mut fa = Fa::empty(n);
        fa.states.extend(a.states.iter().cloned());
        fa.states.extend(b.states.iter().cloned());

        fa.start = a.start.iter().map(|&s| s + offset_a).collect();
        fa.finals = b.finals.iter().map(|&s| s + offset_b).collect();

        graft(&mut fa, a, offset_a);
        graft(&mut fa, b, offset_b);

        for &f in &a.finals {
            for &s in &b.start {
                fa.epsilon.set(f + offset_a, s + offset_b);
            }
        }
        fa
    }

    /// Thompson construction: `L(kleene_star(a)) = L(a)*` (includes epsilon).
    pub fn kleene_star(a: &Fa) -> Fa {
        let offset_a = 1;
        let n = offset_a + a.num_states() + 1;
        let mut fa = Fa::empty(n);
        fa.states.push(StateLabel::Fresh(0));
        fa.states.extend(a.states.iter().cloned());
        fa.states.push(StateLabel::Fresh(n as u32 - 1));

        let new_start = 0;
        let new_final = n - 1;
        fa.start.insert(new_start);
        fa.finals.insert(new_final);

        graft(&mut fa, a, offset_a);

        fa.epsilon.set(new_start, new_final);
        for &s in &a.start {
            fa.epsilon.set(new_start, s + offset_a);
        }
        for &f in &a.finals {
            fa.epsilon.set(f + offset_a, new_final);
            fa.epsilon.set(f + offset_a, new_start);
        }
        fa
    }

    /// Kronecker product intersection: `L(intersect(a, b)) = L(a) ∩ L(b)`.
    /// Result states are `StateLabel::Pair(qa, qb)`, in row-major order
    /// `i_a * |b| + i_b`, so callers can recover which operand states
    /// produced a result state.
    pub fn intersect(a: &Fa, b: &Fa) -> Fa {
        let n = a.num_states() * b.num_states();
        let mut fa = Fa::empty(n);
        fa.states = (0..a.num_states())
            .flat_map(|i| {
                (0..b.num_states()).map(move |j| {
                    StateLabel::Pair(Box::new(a.states[i].clone()), Box::new(b.states[j].clone()))
                })
            })
            .collect();

        fa.epsilon = a.epsilon.kron(&b.epsilon);
        let labels: AHashSet<&Symbol> = a
            .by_symbol
            .keys()
            .filter(|s| b.by_symbol.contains_key(*s))
            .collect();
        for label in labels {
            fa.by_symbol.insert(
                label.clone(),
                a.by_symbol[label].kron(&b.by_symbol[label]),
            );
        }

        for &sa in &a.start {
            for &sb in &b.start {
                fa.start.insert(sa * b.num_states() + sb);
            }
        }
        for &fa_a in &a.finals {
            for &fa_b in &b.finals {
                fa.finals.insert(fa_a * b.num_states() + fa_b);
            }
        }
        fa
    }

    /// The set of `(start, reachable)` pairs: every state reachable from
    /// some start state, paired with the start state it is reachable from.
    pub fn reachable_states(&self) -> AHashSet<(usize, usize)> {
        let closure = self.adjacency_matrix().transitive_closure();
        let mut result = AHashSet::default();
        for &s in &self.start {
            result.insert((s, s));
            for q in closure.row_ones(s) {
                result.insert((s, q));
            }
        }
        result
    }

    /// All transitions as `(from, symbol-or-none-for-epsilon, to)` triples.
    pub fn transitions(&self) -> Vec<(usize, Option<Symbol>, usize)> {
        let mut out = Vec::new();
        for i in 0..self.num_states() {
            for j in self.epsilon.row_ones(i) {
                out.push((i, None, j));
            }
        }
        // `by_symbol`'s iteration order is unspecified (ahash), so the
        // symbols are sorted first to keep this method's output
        // deterministic across runs, which diagnostics (`dot.rs`) rely on.
        let mut symbols: Vec<&Symbol> = self.by_symbol.keys().collect();
        symbols.sort();
        for sym in symbols {
            let m = &self.by_symbol[sym];
            for i in 0..self.num_states() {
                for j in m.row_ones(i) {
                    out.push((i, Some(sym.clone()), j));
                }
            }
        }
        out
    }

    /// Returns a copy with the start-state set replaced or augmented.
    /// `additional = false` replaces the set (`only start states`); `true`
    /// unions it in.
    pub fn with_start(&self, states: &AHashSet<usize>, additional: bool) -> Fa {
        let mut fa = self.clone();
        if additional {
            fa.start.extend(states.iter().copied());
        } else {
            fa.start = states.clone();
        }
        fa
    }

    /// As [`Fa::with_start`], but for final states.
    pub fn with_final(&self, states: &AHashSet<usize>, additional: bool) -> Fa {
        let mut fa = self.clone();
        if additional {
            fa.finals.extend(states.iter().copied());
        } else {
            fa.finals = states.clone();
        }
        fa
    }

    /// Determinizes via subset construction over epsilon-closures. The
    /// result's states are `Fresh` (their identity is a set of source
    /// states, which is not itself an opaque token).
    pub fn determinize(&self) -> Fa {
        let start_set = self.epsilon_closure(&self.start);
        let mut set_to_index: AHashMap<Vec<usize>, usize> = AHashMap::default();
        let mut sets: Vec<AHashSet<usize>> = Vec::new();
        let key_of = |s: &AHashSet<usize>| {
            let mut v: Vec<usize> = s.iter().copied().collect();
            v.sort_unstable();
            v
        };

        let start_key = key_of(&start_set);
        set_to_index.insert(start_key, 0);
        sets.push(start_set);

        let alphabet: Vec<Symbol> = self.by_symbol.keys().cloned().collect();
        let mut transitions: Vec<AHashMap<Symbol, usize>> = vec![AHashMap::default()];

        let mut frontier = vec![0usize];
        while let Some(cur) = frontier.pop() {
            for sym in &alphabet {
                let mut next = AHashSet::default();
                if let Some(m) = self.by_symbol.get(sym) {
                    for &s in &sets[cur] {
                        next.extend(m.row_ones(s));
                    }
                }
                if next.is_empty() {
                    continue;
                }
                let next = self.epsilon_closure(&next);
                let key = key_of(&next);
                let idx = *set_to_index.entry(key).or_insert_with(|| {
                    sets.push(next.clone());
                    transitions.push(AHashMap::default());
                    let idx = sets.len() - 1;
                    frontier.push(idx);
                    idx
                });
                transitions[cur].insert(sym.clone(), idx);
            }
        }

        let n = sets.len();
        let mut fa = Fa::empty(n);
        fa.states = (0..n).map(|i| StateLabel::Fresh(i as u32)).collect();
        fa.start.insert(0);
        for (i, set) in sets.iter().enumerate() {
            if set.iter().any(|s| self.finals.contains(s)) {
                fa.finals.insert(i);
            }
        }
        for (from, trans) in transitions.into_iter().enumerate() {
            for (sym, to) in trans {
                let m = fa
                    .by_symbol
                    .entry(sym)
                    .or_insert_with(|| BoolMatrix::zero(n));
                m.set(from, to);
            }
        }
        fa
    }

    /// Minimizes a deterministic FA by partition refinement (Moore's
    /// algorithm): states start partitioned by accept/reject, and the
    /// partition is refined by transition behavior until it stops changing.
    /// Callers should [`Fa::determinize`] first; minimizing a nondeterministic
    /// FA is not meaningful.
    pub fn minimize(&self) -> Fa {
        let n = self.num_states();
        if n == 0 {
            return self.clone();
        }
        let alphabet: Vec<Symbol> = self.by_symbol.keys().cloned().collect();
        let mut class_of: Vec<usize> = (0..n)
            .map(|i| usize::from(self.finals.contains(&i)))
            .collect();

        loop {
            let mut signature: AHashMap<(usize, Vec<Option<usize>>), usize> = AHashMap::default();
            let mut new_class = vec![0usize; n];
            for s in 0..n {
                let sig: Vec<Option<usize>> = alphabet
                    .iter()
                    .map(|sym| {
                        self.by_symbol[sym]
                            .row_ones(s)
                            .next()
                            .map(|t| class_of[t])
                    })
                    .collect();
                let key = (class_of[s], sig);
                let next_id = signature.len();
                let id = *signature.entry(key).or_insert(next_id);
                new_class[s] = id;
            }
            if new_class == class_of {
                break;
            }
            class_of = new_class;
        }

        let num_classes = class_of.iter().copied().max().map(|m| m + 1).unwrap_or(0);
        let mut fa = Fa::empty(num_classes);
        fa.states = (0..num_classes)
            .map(|i| StateLabel::Fresh(i as u32))
            .collect();
        for s in 0..n {
            let c = class_of[s];
            if self.start.contains(&s) {
                fa.start.insert(c);
            }
            if self.finals.contains(&s) {
                fa.finals.insert(c);
            }
        }
        for sym in &alphabet {
            let src = &self.by_symbol[sym];
            let mut m = BoolMatrix::zero(num_classes);
            for s in 0..n {
                for t in src.row_ones(s) {
                    m.set(class_of[s], class_of[t]);
                }
            }
            fa.by_symbol.insert(sym.clone(), m);
        }
        fa
    }

    /// Whether `word` (a sequence of terminal labels) is accepted.
    pub fn accepts(&self, word: &[&str]) -> bool {
        let mut current = self.epsilon_closure(&self.start);
        for sym in word {
            let mut next = AHashSet::default();
            if let Some(m) = self.by_symbol.get(&Symbol::Terminal((*sym).to_string())) {
                for &s in &current {
                    next.extend(m.row_ones(s));
                }
            }
            current = self.epsilon_closure(&next);
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|s| self.finals.contains(s))
    }
}

/// Copies `src`'s epsilon/per-symbol transitions into `dst` at `offset`.
fn graft(dst: &mut Fa, src: &Fa, offset: usize) {
    for i in 0..src.num_states() {
        for j in src.epsilon.row_ones(i) {
            dst.epsilon.set(i + offset, j + offset);
        }
    }
    for (sym, m) in &src.by_symbol {
        let dm = dst
            .by_symbol
            .entry(sym.clone())
            .or_insert_with(|| BoolMatrix::zero(dst.num_states()));
        for i in 0..src.num_states() {
            for j in m.row_ones(i) {
                dm.set(i + offset, j + offset);
            }
        }
    }
}

/// Multi-source BFS under a regular constraint: the set of graph nodes
/// reachable from `start_nodes` by a word in `L(regex_dfa)`, per spec
/// §4.1's block-diagonal frontier construction.
pub fn regexp_reachability(
    regex_dfa: &Fa,
    graph_nfa: &Fa,
    start_nodes: &AHashSet<usize>,
) -> AHashSet<usize> {
    let r = regex_dfa.num_states();
    let g = graph_nfa.num_states();

    // Block-diagonal adjacency of R ⊕ G, restricted to shared labels.
    let n = r + g;
    let mut block = BoolMatrix::zero(n);
    let shared: AHashSet<&Symbol> = regex_dfa
        .by_symbol
        .keys()
        .filter(|s| graph_nfa.by_symbol.contains_key(*s))
        .collect();
    for sym in &shared {
        let rm = &regex_dfa.by_symbol[sym];
        let gm = &graph_nfa.by_symbol[sym];
        for i in 0..r {
            for j in rm.row_ones(i) {
                block.set(i, j);
            }
        }
        for i in 0..g {
            for j in gm.row_ones(i) {
                block.set(r + i, r + j);
            }
        }
    }

    // Frontier: (|R|+|G|) x |R|, top block identity, bottom marks current
    // (R-state, start-node) pairs.
    let mut frontier = BoolMatrix::zero(n.max(r));
    for i in 0..r {
        frontier.set(i, i);
    }
    for &r_state in regex_dfa.start_states() {
        for &node in start_nodes {
            frontier.set(r + node, r_state);
        }
    }

    loop {
        let next = block.mul(&frontier);
        let before = frontier.nnz();
        frontier.union_with(&next);
        if frontier.nnz() == before {
            break;
        }
    }

    let mut result = AHashSet::default();
    for node in 0..g {
        for r_state in frontier.row_ones(r + node) {
            if regex_dfa.final_states().contains(&r_state) {
                result.insert(node);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Fa {
        Fa::singleton(Symbol::terminal(s))
    }

    #[test]
    fn union_accepts_either_branch() {
        let fa = Fa::union(&lit("a"), &lit("b"));
        assert!(fa.accepts(&["a"]));
        assert!(fa.accepts(&["b"]));
        assert!(!fa.accepts(&["c"]));
    }

    #[test]
    fn concat_accepts_sequence() {
        let fa = Fa::concat(&lit("a"), &lit("b"));
        assert!(fa.accepts(&["a", "b"]));
        assert!(!fa.accepts(&["a"]));
        assert!(!fa.accepts(&["b", "a"]));
    }

    #[test]
    fn kleene_star_accepts_empty_and_repeats() {
        let fa = Fa::kleene_star(&lit("a"));
        assert!(fa.accepts(&[]));
        assert!(fa.accepts(&["a"]));
        assert!(fa.accepts(&["a", "a", "a"]));
        assert!(!fa.accepts(&["b"]));
    }

    #[test]
    fn intersect_is_language_intersection() {
        let ab_star = Fa::kleene_star(&Fa::concat(&lit("a"), &lit("b")));
        let a_star = Fa::kleene_star(&lit("a"));
        let fa = Fa::intersect(&ab_star.determinize(), &a_star.determinize());
        assert!(fa.accepts(&[]));
        assert!(!fa.accepts(&["a", "b"]));
    }

    #[test]
    fn minimize_is_idempotent_and_language_equivalent() {
        let fa = Fa::kleene_star(&Fa::union(&lit("a"), &lit("b"))).determinize();
        let min1 = fa.minimize();
        let min2 = min1.minimize();
        assert_eq!(min1.num_states(), min2.num_states());
        for word in [vec![], vec!["a"], vec!["a", "b", "a"], vec!["c"]] {
            let w: Vec<&str> = word.iter().map(|s| s.as_ref()).collect();
            assert_eq!(fa.accepts(&w), min1.accepts(&w));
        }
    }

    #[test]
    fn transitive_closure_is_a_fixed_point() {
        let mut m = BoolMatrix::zero(4);
        m.set(0, 1);
        m.set(1, 2);
        m.set(2, 3);
        let closure = m.transitive_closure();
        let squared_plus_self = {
            let mut c = closure.clone();
            c.union_with(&closure.mul(&closure));
            c
        };
        assert_eq!(closure.nnz(), squared_plus_self.nnz());
    }

    #[test]
    fn empty_automaton_intersect_is_empty() {
        let empty = Fa::empty(0);
        let fa = Fa::intersect(&empty, &lit("a"));
        assert_eq!(fa.num_states(), 0);
        assert!(!fa.accepts(&["a"]));
    }

    #[test]
    fn with_start_only_replaces_the_set() {
        let fa = lit("a");
        let replaced = fa.with_start(&[1].into_iter().collect(), false);
        assert_eq!(replaced.start_states(), &[1].into_iter().collect());
        assert_eq!(replaced.final_states(), &[1].into_iter().collect());
    }
}
