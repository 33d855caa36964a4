//! The tree-walking GQL interpreter: operator dispatch,
//! `with`/`of` automaton builders/accessors, `mapped`/`filtered with`,
//! lambda calls, `load` with a per-run cache, and `rec` nonterminal tokens.

use std::rc::Rc;

use ahash::AHashSet;
use log::debug;

use crate::ast::{BinOp, Expr, GetWhat, Literal, Pattern, Program, StartOrFinal, Stmt, UnOp, WithClause};
use crate::config::InternalConfig;
use crate::error::{ErrorKind, Result, RsmqlError, Span};
use crate::fa::{Fa, Symbol};
use crate::graph::Graph;
use crate::loader::{parse_csv, BuiltinDatasets, GraphSource};
use crate::rsm::Rsm;
use crate::value::{partial_cmp, render, type_tag, values_equal, Scope, ScopeStack, Value};

/// Evaluates a whole program, printing each top-level expression
/// statement's rendered result via `on_print`, and returns normally or
/// with the first error encountered (GQL programs abort on first error).
pub struct Interpreter {
    scopes: ScopeStack,
    config: InternalConfig,
    load_cache: std::collections::HashMap<String, Rc<Graph>>,
    datasets: BuiltinDatasets,
}

impl Interpreter {
    /// Builds an interpreter with the given configuration.
    pub fn new(config: InternalConfig) -> Self {
        Self {
            scopes: ScopeStack::new(),
            config,
            load_cache: std::collections::HashMap::new(),
            datasets: BuiltinDatasets,
        }
    }

    /// Runs `program`, invoking `on_print` for every top-level expression
    /// statement's result, in source order.
    pub fn run(&mut self, program: &Program, mut on_print: impl FnMut(String)) -> Result<()> {
        for stmt in &program.statements {
            match stmt {
                Stmt::Let { name, value, .. } => {
                    let v = self.eval(value)?;
                    self.scopes.bind(name.clone(), v);
                }
                Stmt::Print { value, .. } => {
                    let v = self.eval(value)?;
                    on_print(render(&v));
                }
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit, _) => Ok(literal_value(lit)),
            Expr::Name(name, span) => self
                .scopes
                .get(name)
                .cloned()
                .ok_or_else(|| RsmqlError::new(ErrorKind::NameError(name.clone()), *span)),
            Expr::Tuple(items, _) => {
                let values = items.iter().map(|e| self.eval(e)).collect::<Result<_>>()?;
                Ok(Value::Tuple(values))
            }
            Expr::Set(items, span) => {
                let mut values: Vec<Value> = Vec::new();
                for item in items {
                    let v = self.eval(item)?;
                    if matches!(v, Value::Lambda { .. }) {
                        return Err(type_error(&["non-lambda"], &v, *span));
                    }
                    if !values.iter().any(|existing| values_equal(existing, &v)) {
                        values.push(v);
                    }
                }
                Ok(Value::Set(values))
            }
            Expr::BinOp { op, lhs, rhs, span } => self.eval_binop(*op, lhs, rhs, *span),
            Expr::UnOp { op, operand, span } => self.eval_unop(*op, operand, *span),
            Expr::Load(inner, span) => self.eval_load(inner, *span),
            Expr::Rec(name, _) => {
                let fa = Fa::singleton(Symbol::Nonterminal(name.clone()));
                Ok(Value::Rsm { name: Some(name.clone()), rsm: Rc::new(Rsm::from_fa(&fa)) })
            }
            Expr::With { clause, which, base, states, span } => {
                self.eval_with(*clause, *which, base, states, *span)
            }
            Expr::Of { what, base, span } => self.eval_of(*what, base, *span),
            Expr::Map { collection, lambda, span } => self.eval_map(collection, lambda, *span),
            Expr::Filter { collection, lambda, span } => {
                self.eval_filter(collection, lambda, *span)
            }
            Expr::Lambda { param, body, .. } => Ok(Value::Lambda {
                param: param.clone(),
                body: Rc::new((**body).clone()),
                closure: Rc::new(self.scopes.snapshot()),
            }),
            Expr::Call { callee, args, span } => self.eval_call(callee, args, *span),
        }
    }

    fn eval_load(&mut self, inner: &Expr, span: Span) -> Result<Value> {
        let name_value = self.eval(inner)?;
        let name = match &name_value {
            Value::Str(s) => s.clone(),
            other => {
                return Err(RsmqlError::new(
                    ErrorKind::TypeError {
                        expected: vec!["string".to_string()],
                        actual: type_tag(other).to_string(),
                        value: render(other),
                    },
                    span,
                ))
            }
        };

        if self.config.load_cache_enabled() {
            if let Some(cached) = self.load_cache.get(&name) {
                debug!("load: cache hit for `{name}`");
                return Ok(Value::Fa(Rc::new(Fa::from_graph(cached, None, None))));
            }
        }

        let graph = if let Ok(contents) = std::fs::read_to_string(&name) {
            parse_csv(&contents)?
        } else if let Some(g) = self.datasets.resolve(&name) {
            g
        } else {
            return Err(RsmqlError::new(
                ErrorKind::LoaderError(name.clone(), "no such dataset or file".to_string()),
                span,
            ));
        };

        let graph = Rc::new(graph);
        if self.config.load_cache_enabled() {
            self.load_cache.insert(name, graph.clone());
        }
        Ok(Value::Fa(Rc::new(Fa::from_graph(&graph, None, None))))
    }

    fn eval_binop(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Result<Value> {
        let l = self.eval(lhs)?;
        let r = self.eval(rhs)?;
        match op {
            BinOp::Eq => return Ok(Value::Bool(values_equal(&l, &r))),
            BinOp::NotEq => return Ok(Value::Bool(!values_equal(&l, &r))),
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
                let ord = partial_cmp(&l, &r).ok_or_else(|| {
                    RsmqlError::new(
                        ErrorKind::TypeError {
                            expected: vec!["comparable operands".to_string()],
                            actual: format!("{} and {}", type_tag(&l), type_tag(&r)),
                            value: format!("{} {}", render(&l), render(&r)),
                        },
                        span,
                    )
                })?;
                use std::cmp::Ordering::*;
                let result = match (op, ord) {
                    (BinOp::Lt, Less) => true,
                    (BinOp::LtEq, Less | Equal) => true,
                    (BinOp::Gt, Greater) => true,
                    (BinOp::GtEq, Greater | Equal) => true,
                    _ => false,
                };
                return Ok(Value::Bool(result));
            }
            BinOp::In | BinOp::NotIn => {
                let found = match &r {
                    Value::Set(items) => items.iter().any(|v| values_equal(v, &l)),
                    other => {
                        return Err(RsmqlError::new(
                            ErrorKind::TypeError {
                                expected: vec!["set".to_string()],
                                actual: type_tag(other).to_string(),
                                value: render(other),
                            },
                            span,
                        ))
                    }
                };
                let result = if op == BinOp::NotIn { !found } else { found };
                return Ok(Value::Bool(result));
            }
            BinOp::And => {
                let (a, b) = (as_bool(l, span)?, as_bool(r, span)?);
                return Ok(Value::Bool(a && b));
            }
            BinOp::Or => {
                let (a, b) = (as_bool(l, span)?, as_bool(r, span)?);
                return Ok(Value::Bool(a || b));
            }
            _ => {}
        }

        match op {
            BinOp::Add => self.eval_add(l, r, span),
            BinOp::Sub => match (&l, &r) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
                (Value::Int(a), Value::Real(b)) => Ok(Value::Real(*a as f64 - b)),
                (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a - *b as f64)),
                (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a - b)),
                _ => Err(type_error(&["int", "real"], &l, span)),
            },
            BinOp::Mul => self.eval_mul(l, r, span),
            BinOp::Div => self.eval_div(l, r, span),
            BinOp::BitAnd => self.eval_bitand(l, r, span),
            BinOp::BitOr => self.eval_bitor(l, r, span),
            _ => unreachable!("handled above"),
        }
    }

    /// `+`: numeric addition; string concat when both sides are plain
    /// strings; FA/RSM concat otherwise (with
    /// T-Smb lifting strings that appear alongside an automaton).
    fn eval_add(&self, l: Value, r: Value, span: Span) -> Result<Value> {
        match (&l, &r) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(*a as f64 + b)),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a + *b as f64)),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a + b)),
            (Value::Str(s), Value::Int(n)) => Ok(Value::Str(format!("{s}{n}"))),
            (Value::Str(s), Value::Real(n)) => Ok(Value::Str(format!("{s}{n}"))),
            _ => self.automaton_binop(l, r, span, Fa::concat, Rsm::concat),
        }
    }

    /// `*` (binary): numeric multiply, or int×string / string×int repeat.
    fn eval_mul(&self, l: Value, r: Value, span: Span) -> Result<Value> {
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(a as f64 * b)),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a * b as f64)),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a * b)),
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                if n < 0 {
                    return Err(type_error(&["non-negative int"], &Value::Int(n), span));
                }
                Ok(Value::Str(s.repeat(n as usize)))
            }
            (other, _) => Err(type_error(&["int", "real", "string"], &other, span)),
        }
    }

    /// `/`: int÷int is exact when divisible (int result) else real;
    /// int/real, real/int, real/real always real.
    fn eval_div(&self, l: Value, r: Value, span: Span) -> Result<Value> {
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => {
                if b == 0 {
                    return Err(RsmqlError::new(
                        ErrorKind::TypeError {
                            expected: vec!["nonzero divisor".to_string()],
                            actual: "int".to_string(),
                            value: "0".to_string(),
                        },
                        span,
                    ));
                }
                if a % b == 0 {
                    Ok(Value::Int(a / b))
                } else {
                    Ok(Value::Real(a as f64 / b as f64))
                }
            }
            (Value::Int(a), Value::Real(b)) => Ok(Value::Real(a as f64 / b)),
            (Value::Real(a), Value::Int(b)) => Ok(Value::Real(a / b as f64)),
            (Value::Real(a), Value::Real(b)) => Ok(Value::Real(a / b)),
            (other, _) => Err(type_error(&["int", "real"], &other, span)),
        }
    }

    /// `&`: int bitwise and, set intersection, FA∩FA, or RSM∩FA (either
    /// order) via the tensor algorithm.
    fn eval_bitand(&self, l: Value, r: Value, span: Span) -> Result<Value> {
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a & b)),
            (Value::Set(a), Value::Set(b)) => Ok(Value::Set(
                a.into_iter().filter(|x| b.iter().any(|y| values_equal(x, y))).collect(),
            )),
            (l, r) => self.rsm_or_fa_binop(l, r, span, Fa::intersect, true),
        }
    }

    /// `|`: int bitwise or, set union, or FA/RSM union (FA if both sides
    /// are FA, RSM otherwise).
    fn eval_bitor(&self, l: Value, r: Value, span: Span) -> Result<Value> {
        match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a | b)),
            (Value::Set(a), Value::Set(b)) => {
                let mut out = a;
                for item in b {
                    if !out.iter().any(|x| values_equal(x, &item)) {
                        out.push(item);
                    }
                }
                Ok(Value::Set(out))
            }
            (l, r) => self.rsm_or_fa_binop(l, r, span, Fa::union, false),
        }
    }

    /// Shared dispatch for `&`/`|` once int/set cases are ruled out:
    /// FA⊗FA uses `fa_op` directly; any pairing touching an RSM is lifted
    /// to RSM algebra — `intersect` uses the RSM∩FA tensor fixed point
    /// (gated to materialized RSMs only), `union` adjoins boxes.
    fn rsm_or_fa_binop(
        &self,
        l: Value,
        r: Value,
        span: Span,
        fa_op: fn(&Fa, &Fa) -> Fa,
        is_intersect: bool,
    ) -> Result<Value> {
        match (&l, &r) {
            (Value::Fa(a), Value::Fa(b)) => Ok(Value::Fa(Rc::new(fa_op(a, b)))),
            _ => {
                if !matches!(l, Value::Rsm { .. }) && !matches!(r, Value::Rsm { .. }) {
                    let (a, b) = (self.coerce_fa(l, span)?, self.coerce_fa(r, span)?);
                    return Ok(Value::Fa(Rc::new(fa_op(&a, &b))));
                }
                if is_intersect {
                    let (rsm_side, fa_side) = match (&l, &r) {
                        (Value::Rsm { .. }, _) => (l, r),
                        _ => (r, l),
                    };
                    let Value::Rsm { name, rsm } = rsm_side else { unreachable!() };
                    let Some(_) = name else {
                        return Err(RsmqlError::new(
                            ErrorKind::NotImplemented(
                                "intersecting a composite (unnamed) RSM with an FA".to_string(),
                            ),
                            span,
                        ));
                    };
                    let fa = self.coerce_fa(fa_side, span)?;
                    let relation =
                        rsm.intersect_with_fa_capped(&fa, self.config.max_closure_iterations());
                    Ok(Value::Fa(Rc::new(rsm.start_relation(&fa, &relation))))
                } else {
                    let a = self.coerce_rsm(l, span)?;
                    let b = self.coerce_rsm(r, span)?;
                    Ok(Value::Rsm { name: None, rsm: Rc::new(Rsm::union(&a, &b)) })
                }
            }
        }
    }

    /// Shared dispatch for `+` once the string/numeric cases are ruled
    /// out: FA×FA concatenates as FAs; anything touching an RSM adjoins
    /// fresh boxes via `rsm_op`.
    fn automaton_binop(
        &self,
        l: Value,
        r: Value,
        span: Span,
        fa_op: fn(&Fa, &Fa) -> Fa,
        rsm_op: fn(&Rsm, &Rsm) -> Rsm,
    ) -> Result<Value> {
        match (&l, &r) {
            (Value::Fa(a), Value::Fa(b)) => Ok(Value::Fa(Rc::new(fa_op(a, b)))),
            _ if matches!(l, Value::Rsm { .. }) || matches!(r, Value::Rsm { .. }) => {
                let a = self.coerce_rsm(l, span)?;
                let b = self.coerce_rsm(r, span)?;
                Ok(Value::Rsm { name: None, rsm: Rc::new(rsm_op(&a, &b)) })
            }
            _ => {
                let (a, b) = (self.coerce_fa(l, span)?, self.coerce_fa(r, span)?);
                Ok(Value::Fa(Rc::new(fa_op(&a, &b))))
            }
        }
    }

    fn eval_unop(&mut self, op: UnOp, operand: &Expr, span: Span) -> Result<Value> {
        let v = self.eval(operand)?;
        match op {
            UnOp::Not => match v {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(type_error(&["bool"], &other, span)),
            },
            UnOp::Neg => match v {
                Value::Int(n) => Ok(Value::Int(-n)),
                Value::Real(n) => Ok(Value::Real(-n)),
                other => Err(type_error(&["int", "real"], &other, span)),
            },
            UnOp::Star => match v {
                Value::Rsm { rsm, .. } => Ok(Value::Rsm { name: None, rsm: Rc::new(Rsm::star(&rsm)) }),
                other => {
                    let fa = self.coerce_fa(other, span)?;
                    Ok(Value::Fa(Rc::new(Fa::kleene_star(&fa))))
                }
            },
        }
    }

    /// T-Smb: a bare string is coerced to the singleton FA accepting that
    /// one-symbol word whenever an FA is required but a string is found.
    fn coerce_fa(&self, v: Value, span: Span) -> Result<Fa> {
        match v {
            Value::Fa(fa) => Ok((*fa).clone()),
            Value::Str(s) => Ok(Fa::singleton(Symbol::terminal(s))),
            other => Err(type_error(&["FA", "string"], &other, span)),
        }
    }

    /// Lifts a string or plain FA to a single-box RSM so `+`/`|` can
    /// combine it with an actual RSM operand uniformly.
    fn coerce_rsm(&self, v: Value, span: Span) -> Result<Rsm> {
        match v {
            Value::Rsm { rsm, .. } => Ok((*rsm).clone()),
            other => {
                let fa = self.coerce_fa(other, span)?;
                Ok(Rsm::from_fa(&fa))
            }
        }
    }

    fn eval_with(
        &mut self,
        clause: WithClause,
        which: StartOrFinal,
        base: &Expr,
        states: &Expr,
        span: Span,
    ) -> Result<Value> {
        let base_value = self.eval(base)?;
        let fa = self.coerce_fa(base_value, span)?;
        let states_value = self.eval(states)?;
        let nodes = self.value_as_state_set(&states_value, span)?;
        let additional = matches!(clause, WithClause::Additional);
        let fa = match which {
            StartOrFinal::Start => fa.with_start(&nodes, additional),
            StartOrFinal::Final => fa.with_final(&nodes, additional),
        };
        Ok(Value::Fa(Rc::new(fa)))
    }

    fn value_as_state_set(&self, value: &Value, span: Span) -> Result<AHashSet<usize>> {
        match value {
            Value::Set(items) => items
                .iter()
                .map(|v| match v {
                    Value::Int(n) => Ok(*n as usize),
                    other => Err(type_error(&["int"], other, span)),
                })
                .collect(),
            other => Err(type_error(&["set"], other, span)),
        }
    }

    fn eval_of(&mut self, what: GetWhat, base: &Expr, span: Span) -> Result<Value> {
        let value = self.eval(base)?;
        match value {
            Value::Fa(fa) => self.eval_fa_field(what, &fa, span),
            Value::Rsm { rsm, .. } => match what {
                GetWhat::Nodes | GetWhat::Edges | GetWhat::Labels => {
                    self.eval_fa_field(what, rsm.box_for(rsm.start()).ok_or_else(|| {
                        RsmqlError::new(
                            ErrorKind::NameError(rsm.start().to_string()),
                            span,
                        )
                    })?, span)
                }
                _ => Err(RsmqlError::new(
                    ErrorKind::NotImplemented(format!("{what} of an RSM")),
                    span,
                )),
            },
            other => Err(type_error(&["FA", "RSM"], &other, span)),
        }
    }

    fn eval_fa_field(&self, what: GetWhat, fa: &Fa, _span: Span) -> Result<Value> {
        match what {
            GetWhat::StartStates => Ok(int_set(fa.start_states().iter().copied())),
            GetWhat::FinalStates => Ok(int_set(fa.final_states().iter().copied())),
            GetWhat::ReachableStates => {
                let pairs = fa.reachable_states();
                let set = pairs
                    .into_iter()
                    .map(|(s, r)| Value::Tuple(vec![Value::Int(s as i64), Value::Int(r as i64)]))
                    .collect();
                Ok(Value::Set(set))
            }
            GetWhat::Nodes => Ok(int_set(0..fa.num_states())),
            GetWhat::Edges => {
                let set = fa
                    .transitions()
                    .into_iter()
                    .filter_map(|(from, symbol, to)| {
                        let label = match symbol? {
                            Symbol::Terminal(t) => t,
                            Symbol::Nonterminal(n) => n,
                        };
                        Some(Value::Tuple(vec![
                            Value::Int(from as i64),
                            Value::Str(label),
                            Value::Int(to as i64),
                        ]))
                    })
                    .collect();
                Ok(Value::Set(set))
            }
            GetWhat::Labels => {
                let mut labels: Vec<Value> = Vec::new();
                for (_, symbol, _) in fa.transitions() {
                    if let Some(symbol) = symbol {
                        let label = match symbol {
                            Symbol::Terminal(t) => t,
                            Symbol::Nonterminal(n) => n,
                        };
                        let v = Value::Str(label);
                        if !labels.iter().any(|existing| values_equal(existing, &v)) {
                            labels.push(v);
                        }
                    }
                }
                Ok(Value::Set(labels))
            }
        }
    }

    fn eval_map(&mut self, collection: &Expr, lambda: &Expr, span: Span) -> Result<Value> {
        let f = self.eval(lambda)?;
        let items = self.eval_as_items(collection, span)?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.apply(&f, item, span)?);
        }
        Ok(Value::Set(out))
    }

    fn eval_filter(&mut self, collection: &Expr, lambda: &Expr, span: Span) -> Result<Value> {
        let f = self.eval(lambda)?;
        let items = self.eval_as_items(collection, span)?;
        let mut out = Vec::new();
        for item in items {
            let keep = self.apply(&f, item.clone(), span)?;
            match keep {
                Value::Bool(true) => out.push(item),
                Value::Bool(false) => {}
                other => return Err(type_error(&["bool"], &other, span)),
            }
        }
        Ok(Value::Set(out))
    }

    fn eval_as_items(&mut self, collection: &Expr, span: Span) -> Result<Vec<Value>> {
        match self.eval(collection)? {
            Value::Set(items) => Ok(items),
            Value::Tuple(items) => Ok(items),
            other => Err(type_error(&["set", "tuple"], &other, span)),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Result<Value> {
        let f = self.eval(callee)?;
        let mut values = Vec::with_capacity(args.len());
        for a in args {
            values.push(self.eval(a)?);
        }
        let arg = if values.len() == 1 { values.pop().unwrap() } else { Value::Tuple(values) };
        self.apply(&f, arg, span)
    }

    fn apply(&mut self, f: &Value, arg: Value, span: Span) -> Result<Value> {
        let Value::Lambda { param, body, closure } = f else {
            return Err(type_error(&["lambda"], f, span));
        };
        let mut frame = Scope::new();
        for (k, v) in closure_bindings(closure) {
            frame.bind(k, v);
        }
        bind_pattern(&mut frame, param, arg, span)?;
        self.scopes.push(frame);
        let result = self.eval(body);
        self.scopes.pop();
        result
    }
}

fn as_bool(v: Value, span: Span) -> Result<bool> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(type_error(&["bool"], &other, span)),
    }
}

fn closure_bindings(scope: &Scope) -> Vec<(String, Value)> {
    scope.bindings_snapshot()
}

fn bind_pattern(frame: &mut Scope, pattern: &Pattern, value: Value, span: Span) -> Result<()> {
    match pattern {
        Pattern::Name(name) => {
            if name != "_" {
                frame.bind(name.clone(), value);
            }
            Ok(())
        }
        Pattern::Tuple(patterns) => match value {
            Value::Tuple(items) if items.len() == patterns.len() => {
                for (p, v) in patterns.iter().zip(items) {
                    bind_pattern(frame, p, v, span)?;
                }
                Ok(())
            }
            other => Err(RsmqlError::new(
                ErrorKind::ArityError(format!(
                    "tuple pattern of length {} does not match {}",
                    patterns.len(),
                    render(&other)
                )),
                span,
            )),
        },
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Real(n) => Value::Real(*n),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Range(lo, hi) => Value::Set((*lo..*hi).map(Value::Int).collect()),
    }
}

fn int_set(it: impl Iterator<Item = usize>) -> Value {
    Value::Set(it.map(|n| Value::Int(n as i64)).collect())
}

fn type_error(expected: &[&str], actual: &Value, span: Span) -> RsmqlError {
    RsmqlError::new(
        ErrorKind::TypeError {
            expected: expected.iter().map(|s| s.to_string()).collect(),
            actual: type_tag(actual).to_string(),
            value: render(actual),
        },
        span,
    )
}

/// Compiles a stand-alone ECFG source into an RSM, for embedders that want
/// `rec N` to resolve against a grammar loaded alongside the graph. Not
/// wired to surface syntax (no GQL operator names this).
pub fn rsm_from_ecfg_source(source: &str, known_nonterminals: &[&str]) -> Result<Rsm> {
    crate::ecfg::Ecfg::parse(source, known_nonterminals).map(|e| e.to_rsm())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn run_ok(src: &str) -> Vec<String> {
        let program = parse_program(src).unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let mut out = Vec::new();
        interp.run(&program, |s| out.push(s)).unwrap();
        out
    }

    #[test]
    fn simple_expression_prints() {
        assert_eq!(run_ok("1 + 2;"), vec!["3".to_string()]);
    }

    #[test]
    fn let_binding_is_visible_later() {
        assert_eq!(run_ok("let x = 5; x + 1;"), vec!["6".to_string()]);
    }

    #[test]
    fn string_coercion_allows_fa_concat() {
        let out = run_ok("let g = \"a\" + \"b\"; edges of g;");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn scenario_simple_expressions_print_twice() {
        let out = run_ok("let a = \"test\"; >>> a; print a;");
        assert_eq!(out, vec!["\"test\"".to_string(), "\"test\"".to_string()]);
    }

    #[test]
    fn scenario_map_filter_pipeline() {
        let out = run_ok("({0,1} mapped with \\x -> x + 1);");
        assert_eq!(out.len(), 1);

        let out2 = run_ok("(0..3 filtered with \\x -> x != 1 mapped with \\x -> x + 1);");
        assert_eq!(out2.len(), 1);
    }

    #[test]
    fn scenario_type_error_reports_location() {
        let program = parse_program("(- \"1\");").unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let err = interp.run(&program, |_| {}).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TypeError { .. }));
    }

    #[test]
    fn scenario_with_builder_semantics() {
        let out = run_ok("start states of (\"a\" with only start states {1});");
        assert_eq!(out[0], "{1}");
        let out2 = run_ok("final states of (\"a\" with only start states {1});");
        assert_eq!(out2[0], "{1}");
    }

    #[test]
    fn name_error_reports_location() {
        let program = parse_program("unbound_name;").unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let err = interp.run(&program, |_| {}).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NameError(_)));
    }

    #[test]
    fn lambda_arity_mismatch_is_an_arity_error() {
        let program = parse_program("(\\(x, y) -> x)((1));").unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let err = interp.run(&program, |_| {}).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityError(_)));
    }

    #[test]
    fn closures_capture_by_value_at_definition() {
        let out = run_ok("let x = 1; let f = \\y -> x + y; let x = 100; f(1);");
        assert_eq!(out[0], "2");
    }

    #[test]
    fn rec_token_builds_a_single_box_rsm() {
        let out = run_ok("rec S;");
        assert!(out[0].starts_with("<RSM"));
    }

    #[test]
    fn not_in_negates_membership() {
        assert_eq!(run_ok("1 not in {2, 3};"), vec!["true".to_string()]);
    }

    #[test]
    fn division_is_exact_when_divisible() {
        assert_eq!(run_ok("4 / 2;"), vec!["2".to_string()]);
        assert_eq!(run_ok("3 / 2;"), vec!["1.5".to_string()]);
    }
}
