//! `rsmql` command-line front end.
//!
//! Two subcommands, both reading a GQL source file: `parse` (parse-and-print,
//! optionally emitting GraphViz DOT) and `run` (parse-and-interpret). Exit
//! codes: 0 on success, 1 on a parse error, 2 on a runtime error.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rsmql::config::InternalConfig;
use rsmql::dot::program_to_dot;
use rsmql::parser::parse_program;
use rsmql::Interpreter;

/// `rsmql`: a context-free path querying engine with a small DSL for
/// building and combining automata.
#[derive(Parser)]
#[command(name = "rsmql", version, about, long_about = None)]
struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a GQL source file and print its AST (or DOT with `--dot`).
    Parse {
        /// Path to the `.gql` source file.
        path: PathBuf,
        /// Emit a GraphViz DOT tree instead of the default printed form.
        #[arg(long)]
        dot: bool,
    },
    /// Parse and interpret a GQL source file, printing each top-level
    /// expression statement's result.
    Run {
        /// Path to the `.gql` source file.
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { path, dot } => run_parse(&path, dot),
        Command::Run { path } => run_run(&path),
    }
}

fn read_source(path: &PathBuf) -> Result<String, ExitCode> {
    fs::read_to_string(path).map_err(|err| {
        eprintln!("error: could not read {}: {err}", path.display());
        ExitCode::from(2)
    })
}

fn run_parse(path: &PathBuf, dot: bool) -> ExitCode {
    let source = match read_source(path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match parse_program(&source) {
        Ok(program) => {
            if dot {
                println!("{}", program_to_dot(&program));
            } else {
                println!("{program:#?}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err.render());
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run_run(path: &PathBuf) -> ExitCode {
    let source = match read_source(path) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let program = match parse_program(&source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", err.render());
            return ExitCode::from(err.exit_code() as u8);
        }
    };
    let mut interpreter = Interpreter::new(InternalConfig::default());
    let result = interpreter.run(&program, |line| println!("{line}"));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render());
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
