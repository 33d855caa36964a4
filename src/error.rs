//! The crate's error surface: a single [`RsmqlError`] carrying an [`ErrorKind`]
//! and the source location of the AST node under evaluation.

use std::fmt;

/// A 1-based (line, column) pair recovered from the AST node under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Span {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Span {
    /// Builds a [`Span`] from a 1-based line and column.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The taxonomy of runtime/parse errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    /// Syntactic failure from the lexer/parser.
    #[error("unexpected {found}, expected {expected}")]
    ParseError {
        /// The offending token's textual form.
        found: String,
        /// A human-readable description of what was expected.
        expected: String,
    },
    /// Reference to an unbound name.
    #[error("name `{0}` is not bound")]
    NameError(String),
    /// Operand does not satisfy an operator's typing rule.
    #[error("type error: expected {}, found {actual}", .expected.join(" or "))]
    TypeError {
        /// The expected type tag(s).
        expected: Vec<String>,
        /// The actual type tag found.
        actual: String,
        /// The printed form of the offending value.
        value: String,
    },
    /// Tuple pattern mismatch, or a lambda called with the wrong shape.
    #[error("arity error: {0}")]
    ArityError(String),
    /// `load` could not resolve a name.
    #[error("could not load `{0}`: {1}")]
    LoaderError(String, String),
    /// ECFG with a duplicate LHS, empty LHS, or malformed line.
    #[error("grammar error: {0}")]
    GrammarError(String),
    /// An operator combination explicitly out of scope.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// The crate-wide error type: an [`ErrorKind`] stamped with the [`Span`] of
/// the AST node being evaluated when the failure occurred.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} (at {span})")]
pub struct RsmqlError {
    /// The underlying failure.
    pub kind: ErrorKind,
    /// Where in the source it happened.
    pub span: Span,
}

impl RsmqlError {
    /// Wraps an [`ErrorKind`] with the location it occurred at.
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The process-exit code this error should map to.
    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::ParseError { .. } => 1,
            _ => 2,
        }
    }

    /// Renders the error the way the CLI prints it.
    pub fn render(&self) -> String {
        match &self.kind {
            ErrorKind::ParseError { found, expected } => {
                format!(
                    "Parsing error at {}: unexpected {found}, expected {expected}",
                    self.span
                )
            }
            other => format!("Runtime error at {}: {other}", self.span),
        }
    }
}

pub type Result<T> = std::result::Result<T, RsmqlError>;
