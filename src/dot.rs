//! GraphViz DOT diagnostics for FAs and ASTs, grounded in
//! `original_source/project/graphs.py::write_dot` and `lang.py`'s
//! `DotTreeVisitor`. Used by `rsmql parse --dot` and by `rsmql run --dot`.

use std::fmt::Write as _;

use crate::ast::{Expr, Program, Stmt};
use crate::fa::Fa;

/// Renders an automaton as a DOT digraph: double-circled final states,
/// an unlabeled arrow into each start state, one edge per transition
/// (epsilon transitions labeled `ε`).
pub fn fa_to_dot(fa: &Fa, name: &str) -> String {
    let mut out = String::new();
    writeln!(out, "digraph {name} {{").unwrap();
    writeln!(out, "    rankdir=LR;").unwrap();
    for i in 0..fa.num_states() {
        let shape = if fa.final_states().contains(&i) {
            "doublecircle"
        } else {
            "circle"
        };
        writeln!(out, "    {i} [shape={shape}];").unwrap();
    }
    let mut starts: Vec<usize> = fa.start_states().iter().copied().collect();
    starts.sort_unstable();
    for (i, start) in starts.into_iter().enumerate() {
        writeln!(out, "    start{i} [shape=point];").unwrap();
        writeln!(out, "    start{i} -> {start};").unwrap();
    }
    for (from, symbol, to) in fa.transitions() {
        let label = match symbol {
            None => "\u{03b5}".to_string(),
            Some(crate::fa::Symbol::Terminal(t)) => t,
            Some(crate::fa::Symbol::Nonterminal(n)) => format!("#{n}"),
        };
        writeln!(out, "    {from} -> {to} [label=\"{label}\"];").unwrap();
    }
    writeln!(out, "}}").unwrap();
    out
}

/// Renders a parsed program's AST as a DOT tree, one node per syntax node.
pub fn program_to_dot(program: &Program) -> String {
    let mut out = String::new();
    let mut counter = 0u32;
    writeln!(out, "digraph ast {{").unwrap();
    let root = fresh(&mut counter);
    writeln!(out, "    {root} [label=\"Program\"];").unwrap();
    for stmt in &program.statements {
        let child = stmt_node(stmt, &mut out, &mut counter);
        writeln!(out, "    {root} -> {child};").unwrap();
    }
    writeln!(out, "}}").unwrap();
    out
}

fn fresh(counter: &mut u32) -> String {
    *counter += 1;
    format!("n{counter}")
}

fn stmt_node(stmt: &Stmt, out: &mut String, counter: &mut u32) -> String {
    let id = fresh(counter);
    match stmt {
        Stmt::Let { name, value, .. } => {
            writeln!(out, "    {id} [label=\"let {name}\"];").unwrap();
            let child = expr_node(value, out, counter);
            writeln!(out, "    {id} -> {child};").unwrap();
        }
        Stmt::Print { value, .. } => {
            writeln!(out, "    {id} [label=\"print\"];").unwrap();
            let child = expr_node(value, out, counter);
            writeln!(out, "    {id} -> {child};").unwrap();
        }
    }
    id
}

fn expr_node(expr: &Expr, out: &mut String, counter: &mut u32) -> String {
    let id = fresh(counter);
    let mut children: Vec<String> = Vec::new();
    let label = match expr {
        Expr::Literal(lit, _) => format!("{lit:?}"),
        Expr::Name(name, _) => format!("Name({name})"),
        Expr::Tuple(items, _) => {
            children.extend(items.iter().map(|e| expr_node(e, out, counter)));
            "Tuple".to_string()
        }
        Expr::Set(items, _) => {
            children.extend(items.iter().map(|e| expr_node(e, out, counter)));
            "Set".to_string()
        }
        Expr::BinOp { op, lhs, rhs, .. } => {
            children.push(expr_node(lhs, out, counter));
            children.push(expr_node(rhs, out, counter));
            format!("BinOp({op:?})")
        }
        Expr::UnOp { op, operand, .. } => {
            children.push(expr_node(operand, out, counter));
            format!("UnOp({op:?})")
        }
        Expr::Load(inner, _) => {
            children.push(expr_node(inner, out, counter));
            "load".to_string()
        }
        Expr::Rec(name, _) => format!("rec {name}"),
        Expr::With { clause, which, base, states, .. } => {
            children.push(expr_node(base, out, counter));
            children.push(expr_node(states, out, counter));
            format!("with({clause:?} {which:?})")
        }
        Expr::Of { what, base, .. } => {
            children.push(expr_node(base, out, counter));
            format!("{what:?} of")
        }
        Expr::Map { collection, lambda, .. } => {
            children.push(expr_node(collection, out, counter));
            children.push(expr_node(lambda, out, counter));
            "mapped with".to_string()
        }
        Expr::Filter { collection, lambda, .. } => {
            children.push(expr_node(collection, out, counter));
            children.push(expr_node(lambda, out, counter));
            "filtered with".to_string()
        }
        Expr::Lambda { param, body, .. } => {
            children.push(expr_node(body, out, counter));
            format!("lambda({param:?})")
        }
        Expr::Call { callee, args, .. } => {
            children.push(expr_node(callee, out, counter));
            children.extend(args.iter().map(|e| expr_node(e, out, counter)));
            "call".to_string()
        }
    };
    writeln!(out, "    {id} [label=\"{label}\"];").unwrap();
    for child in children {
        writeln!(out, "    {id} -> {child};").unwrap();
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fa::Symbol;

    #[test]
    fn fa_dot_has_one_node_line_per_state() {
        let fa = Fa::singleton(Symbol::terminal("a"));
        let dot = fa_to_dot(&fa, "g");
        assert!(dot.contains("digraph g"));
        assert!(dot.contains("doublecircle"));
    }

    #[test]
    fn program_dot_wraps_statements_under_one_root() {
        let program = crate::parser::parse_program("1 + 2;").unwrap();
        let dot = program_to_dot(&program);
        assert!(dot.starts_with("digraph ast {"));
        assert!(dot.contains("BinOp"));
    }
}
