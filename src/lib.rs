/*!
# rsmql

A context-free path querying (CFPQ) engine over labeled directed
multigraphs, with GQL, a small DSL for building and combining automata and
running CFPQ queries against a loaded graph.

```rust
use rsmql::config::InternalConfig;
use rsmql::interpreter::Interpreter;
use rsmql::parser::parse_program;

let program = parse_program("let g = \"a\" + \"b\"; labels of g;").unwrap();
let mut interpreter = Interpreter::new(InternalConfig::default());
let mut printed = Vec::new();
interpreter.run(&program, |line| printed.push(line)).unwrap();
assert_eq!(printed, vec!["{\"a\", \"b\"}".to_string()]);
```

The crate is organized bottom-up:

- [`graph`]: the host labeled directed multigraph.
- [`fa`]: finite automata and their algebra (union, concat, Kleene star,
  Kronecker-product intersection, determinization, minimization).
- [`regex`]: the regex dialect used by automaton literals, Thompson-compiled
  to [`fa::Fa`].
- [`rsm`]: recursive state machines (one box per nonterminal) and their
  intersection with a graph-lifted FA.
- [`cfg`] / [`ecfg`]: context-free and extended context-free grammars, and
  conversion to Weak Chomsky Normal Form / to an [`rsm::Rsm`].
- [`cfpq`]: the Hellings and matrix-fixed-point CFPQ solvers.
- [`ast`] / [`lexer`] / [`parser`] / [`value`] / [`interpreter`]: the GQL
  surface language end to end.
- [`loader`]: graph sources (CSV edge lists, a small built-in dataset
  registry, and the synthetic two-cycles benchmark builder).
- [`dot`]: GraphViz DOT diagnostics for automata and parsed programs.
- [`error`]: the crate-wide error type and source-location tracking.
- [`config`]: interpreter configuration.
*/
#![warn(missing_docs)]

pub mod ast;
pub mod cfg;
pub mod cfpq;
pub mod config;
pub mod dot;
pub mod ecfg;
pub mod error;
pub mod fa;
pub mod graph;
pub mod interpreter;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod regex;
pub mod rsm;
pub mod value;

pub use config::{Config, InternalConfig};
pub use error::{ErrorKind, Result, RsmqlError, Span};
pub use interpreter::Interpreter;

/// Parses and runs `source` in one call, collecting every printed line.
/// This is the entry point `main.rs`'s `run` subcommand uses.
pub fn interpret(source: &str, config: InternalConfig) -> Result<Vec<String>> {
    let program = parser::parse_program(source)?;
    let mut interpreter = Interpreter::new(config);
    let mut printed = Vec::new();
    interpreter.run(&program, |line| printed.push(line))?;
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_runs_a_whole_program() {
        let printed = interpret("1 + 1; 2 + 2;", InternalConfig::default()).unwrap();
        assert_eq!(printed, vec!["2".to_string(), "4".to_string()]);
    }

    #[test]
    fn interpret_surfaces_parse_errors() {
        let err = interpret("let = 1;", InternalConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
