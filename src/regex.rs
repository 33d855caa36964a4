//! The regex dialect used for `with`/`of` automaton literals and for
//! `ecfg.rs` box bodies: whitespace-separated concatenation,
//! `|` alternation, postfix `*`, parenthesized grouping, the `epsilon`
//! keyword, and backslash-escaped literal symbols.

use crate::error::{ErrorKind, RsmqlError, Span};
use crate::fa::{Fa, Symbol};

/// A parsed regex, before compilation to an [`Fa`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// The empty-string language.
    Epsilon,
    /// A single literal symbol.
    Symbol(String),
    /// A reference to another RSM box (only produced by `ecfg.rs`'s
    /// nonterminal re-tagging pass; never by [`parse`] directly).
    NonterminalRef(String),
    /// Alternation: `a | b`.
    Union(Box<Regex>, Box<Regex>),
    /// Concatenation: `a b`.
    Concat(Box<Regex>, Box<Regex>),
    /// Kleene closure: `a*`.
    Star(Box<Regex>),
}

impl Regex {
    /// Compiles this regex to an NFA via Thompson construction, reusing the
    /// same [`Fa`] combinators the FA kernel exposes elsewhere.
    pub fn compile(&self) -> Fa {
        match self {
            Regex::Epsilon => Fa::epsilon(),
            Regex::Symbol(s) => Fa::singleton(Symbol::terminal(s.clone())),
            Regex::NonterminalRef(n) => Fa::singleton(Symbol::Nonterminal(n.clone())),
            Regex::Union(a, b) => Fa::union(&a.compile(), &b.compile()),
            Regex::Concat(a, b) => Fa::concat(&a.compile(), &b.compile()),
            Regex::Star(a) => Fa::kleene_star(&a.compile()),
        }
    }
}

/// Tokenizes and parses `source` as a regex, per the grammar above.
pub fn parse(source: &str) -> Result<Regex, RsmqlError> {
    let tokens = lex(source)?;
    let mut pos = 0;
    let regex = parse_union(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(RsmqlError::new(
            ErrorKind::ParseError {
                found: format!("{:?}", tokens[pos]),
                expected: "end of regex".to_string(),
            },
            Span::default(),
        ));
    }
    Ok(regex)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Symbol(String),
    Epsilon,
    Pipe,
    Star,
    LParen,
    RParen,
}

fn lex(source: &str) -> Result<Vec<Token>, RsmqlError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '\\' => {
                if i + 1 >= chars.len() {
                    return Err(RsmqlError::new(
                        ErrorKind::ParseError {
                            found: "end of input".to_string(),
                            expected: "character after `\\`".to_string(),
                        },
                        Span::default(),
                    ));
                }
                tokens.push(Token::Symbol(chars[i + 1].to_string()));
                i += 2;
            }
            _ => {
                let start = i;
                while i < chars.len()
                    && !matches!(chars[i], ' ' | '\t' | '\n' | '\r' | '|' | '*' | '(' | ')' | '\\')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if word == "epsilon" {
                    tokens.push(Token::Epsilon);
                } else {
                    tokens.push(Token::Symbol(word));
                }
            }
        }
    }
    Ok(tokens)
}

fn parse_union(tokens: &[Token], pos: &mut usize) -> Result<Regex, RsmqlError> {
    let mut left = parse_concat(tokens, pos)?;
    while matches!(tokens.get(*pos), Some(Token::Pipe)) {
        *pos += 1;
        let right = parse_concat(tokens, pos)?;
        left = Regex::Union(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_concat(tokens: &[Token], pos: &mut usize) -> Result<Regex, RsmqlError> {
    let mut left = parse_star(tokens, pos)?;
    while matches!(
        tokens.get(*pos),
        Some(Token::Symbol(_)) | Some(Token::Epsilon) | Some(Token::LParen)
    ) {
        let right = parse_star(tokens, pos)?;
        left = Regex::Concat(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_star(tokens: &[Token], pos: &mut usize) -> Result<Regex, RsmqlError> {
    let mut atom = parse_atom(tokens, pos)?;
    while matches!(tokens.get(*pos), Some(Token::Star)) {
        *pos += 1;
        atom = Regex::Star(Box::new(atom));
    }
    Ok(atom)
}

fn parse_atom(tokens: &[Token], pos: &mut usize) -> Result<Regex, RsmqlError> {
    match tokens.get(*pos) {
        Some(Token::Symbol(s)) => {
            let r = Regex::Symbol(s.clone());
            *pos += 1;
            Ok(r)
        }
        Some(Token::Epsilon) => {
            *pos += 1;
            Ok(Regex::Epsilon)
        }
        Some(Token::LParen) => {
            *pos += 1;
            let inner = parse_union(tokens, pos)?;
            match tokens.get(*pos) {
                Some(Token::RParen) => {
                    *pos += 1;
                    Ok(inner)
                }
                other => Err(RsmqlError::new(
                    ErrorKind::ParseError {
                        found: format!("{other:?}"),
                        expected: "`)`".to_string(),
                    },
                    Span::default(),
                )),
            }
        }
        other => Err(RsmqlError::new(
            ErrorKind::ParseError {
                found: format!("{other:?}"),
                expected: "symbol, `epsilon`, or `(`".to_string(),
            },
            Span::default(),
        )),
    }
}

/// Compiles a regex source string directly to a minimized DFA.
pub fn compile_to_dfa(source: &str) -> Result<Fa, RsmqlError> {
    Ok(parse(source)?.compile().determinize().minimize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_union_concat_star_precedence() {
        let r = parse("a b* | c").unwrap();
        assert_eq!(
            r,
            Regex::Union(
                Box::new(Regex::Concat(
                    Box::new(Regex::Symbol("a".to_string())),
                    Box::new(Regex::Star(Box::new(Regex::Symbol("b".to_string())))),
                )),
                Box::new(Regex::Symbol("c".to_string())),
            )
        );
    }

    #[test]
    fn compiles_and_accepts() {
        let dfa = compile_to_dfa("a b* | c").unwrap();
        assert!(dfa.accepts(&["a"]));
        assert!(dfa.accepts(&["a", "b", "b"]));
        assert!(dfa.accepts(&["c"]));
        assert!(!dfa.accepts(&["b"]));
    }

    #[test]
    fn epsilon_accepts_empty_word_only() {
        let dfa = compile_to_dfa("epsilon").unwrap();
        assert!(dfa.accepts(&[]));
        assert!(!dfa.accepts(&["a"]));
    }

    #[test]
    fn escaped_symbols_are_literal() {
        let dfa = compile_to_dfa("\\*").unwrap();
        assert!(dfa.accepts(&["*"]));
    }
}
