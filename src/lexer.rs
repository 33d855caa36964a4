//! The GQL lexer: `//` line comments, nestable `/* */` block comments,
//! double-quoted strings with backslash escapes, integer/real literals
//! (including scientific notation), and identifiers.

use crate::error::{ErrorKind, RsmqlError, Span};

/// A lexical token, tagged with the [`Span`] where it began.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token's kind and payload.
    pub kind: TokenKind,
    /// Where the token began.
    pub span: Span,
}

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An identifier or keyword; keyword-ness is resolved by the parser.
    Ident(String),
    /// An integer literal.
    Int(i64),
    /// A real literal.
    Real(f64),
    /// A double-quoted string literal, already unescaped.
    Str(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `=`
    Assign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `;`
    Semicolon,
    /// `..`
    DotDot,
    /// `\`
    Backslash,
    /// `->`
    Arrow,
    /// End of input.
    Eof,
}

/// Tokenizes `source` in full, stopping at the first lexical error.
pub fn lex(source: &str) -> Result<Vec<Token>, RsmqlError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let mut line = 1u32;
    let mut col = 1u32;

    macro_rules! advance {
        ($n:expr) => {{
            for _ in 0..$n {
                if chars.get(i) == Some(&'\n') {
                    line += 1;
                    col = 1;
                } else {
                    col += 1;
                }
                i += 1;
            }
        }};
    }

    while i < chars.len() {
        let c = chars[i];
        let span = Span::new(line, col);
        match c {
            ' ' | '\t' | '\r' | '\n' => advance!(1),
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    advance!(1);
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                advance!(2);
                let mut depth = 1u32;
                while i < chars.len() && depth > 0 {
                    if chars.get(i) == Some(&'/') && chars.get(i + 1) == Some(&'*') {
                        depth += 1;
                        advance!(2);
                    } else if chars.get(i) == Some(&'*') && chars.get(i + 1) == Some(&'/') {
                        depth -= 1;
                        advance!(2);
                    } else {
                        advance!(1);
                    }
                }
                if depth != 0 {
                    return Err(RsmqlError::new(
                        ErrorKind::ParseError {
                            found: "end of input".to_string(),
                            expected: "`*/`".to_string(),
                        },
                        span,
                    ));
                }
            }
            '/' => {
                tokens.push(Token { kind: TokenKind::Slash, span });
                advance!(1);
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, span });
                advance!(1);
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, span });
                advance!(1);
            }
            '{' => {
                tokens.push(Token { kind: TokenKind::LBrace, span });
                advance!(1);
            }
            '}' => {
                tokens.push(Token { kind: TokenKind::RBrace, span });
                advance!(1);
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, span });
                advance!(1);
            }
            '&' => {
                tokens.push(Token { kind: TokenKind::Amp, span });
                advance!(1);
            }
            '|' => {
                tokens.push(Token { kind: TokenKind::Pipe, span });
                advance!(1);
            }
            '*' => {
                tokens.push(Token { kind: TokenKind::Star, span });
                advance!(1);
            }
            ';' => {
                tokens.push(Token { kind: TokenKind::Semicolon, span });
                advance!(1);
            }
            '.' if chars.get(i + 1) == Some(&'.') => {
                tokens.push(Token { kind: TokenKind::DotDot, span });
                advance!(2);
            }
            '\\' => {
                tokens.push(Token { kind: TokenKind::Backslash, span });
                advance!(1);
            }
            '+' => {
                tokens.push(Token { kind: TokenKind::Plus, span });
                advance!(1);
            }
            '-' if chars.get(i + 1) == Some(&'>') => {
                tokens.push(Token { kind: TokenKind::Arrow, span });
                advance!(2);
            }
            '-' => {
                tokens.push(Token { kind: TokenKind::Minus, span });
                advance!(1);
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token { kind: TokenKind::EqEq, span });
                advance!(2);
            }
            '=' => {
                tokens.push(Token { kind: TokenKind::Assign, span });
                advance!(1);
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token { kind: TokenKind::NotEq, span });
                advance!(2);
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token { kind: TokenKind::LtEq, span });
                advance!(2);
            }
            '<' => {
                tokens.push(Token { kind: TokenKind::Lt, span });
                advance!(1);
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token { kind: TokenKind::GtEq, span });
                advance!(2);
            }
            '>' => {
                tokens.push(Token { kind: TokenKind::Gt, span });
                advance!(1);
            }
            '"' => {
                advance!(1);
                let mut s = String::new();
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(RsmqlError::new(
                                ErrorKind::ParseError {
                                    found: "end of input".to_string(),
                                    expected: "closing `\"`".to_string(),
                                },
                                span,
                            ))
                        }
                        Some('"') => {
                            advance!(1);
                            break;
                        }
                        Some('\\') => {
                            advance!(1);
                            match chars.get(i) {
                                Some('n') => s.push('\n'),
                                Some('t') => s.push('\t'),
                                Some('"') => s.push('"'),
                                Some('\\') => s.push('\\'),
                                Some(other) => s.push(*other),
                                None => {
                                    return Err(RsmqlError::new(
                                        ErrorKind::ParseError {
                                            found: "end of input".to_string(),
                                            expected: "character after `\\`".to_string(),
                                        },
                                        span,
                                    ))
                                }
                            }
                            advance!(1);
                        }
                        Some(other) => {
                            s.push(*other);
                            advance!(1);
                        }
                    }
                }
                tokens.push(Token { kind: TokenKind::Str(s), span });
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                    advance!(1);
                }
                let mut is_real = false;
                if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                    is_real = true;
                    advance!(1);
                    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                        advance!(1);
                    }
                }
                if matches!(chars.get(i), Some('e') | Some('E')) {
                    let mut lookahead = i + 1;
                    if matches!(chars.get(lookahead), Some('+') | Some('-')) {
                        lookahead += 1;
                    }
                    if chars.get(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                        is_real = true;
                        advance!(lookahead - i);
                        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                            advance!(1);
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if is_real {
                    let value: f64 = text.parse().map_err(|_| {
                        RsmqlError::new(
                            ErrorKind::ParseError {
                                found: text.clone(),
                                expected: "real literal".to_string(),
                            },
                            span,
                        )
                    })?;
                    tokens.push(Token { kind: TokenKind::Real(value), span });
                } else {
                    let value: i64 = text.parse().map_err(|_| {
                        RsmqlError::new(
                            ErrorKind::ParseError {
                                found: text.clone(),
                                expected: "integer literal".to_string(),
                            },
                            span,
                        )
                    })?;
                    tokens.push(Token { kind: TokenKind::Int(value), span });
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while chars.get(i).is_some_and(|c| c.is_alphanumeric() || *c == '_') {
                    advance!(1);
                }
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token { kind: TokenKind::Ident(text), span });
            }
            other => {
                return Err(RsmqlError::new(
                    ErrorKind::ParseError {
                        found: other.to_string(),
                        expected: "a token".to_string(),
                    },
                    span,
                ))
            }
        }
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(line, col),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_keywords_as_plain_idents() {
        let tokens = lex("let x = 1").unwrap();
        assert_eq!(
            tokens.iter().map(|t| &t.kind).collect::<Vec<_>>(),
            vec![
                &TokenKind::Ident("let".to_string()),
                &TokenKind::Ident("x".to_string()),
                &TokenKind::Assign,
                &TokenKind::Int(1),
                &TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_nested_block_comments() {
        let tokens = lex("/* a /* b */ c */ 1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int(1));
    }

    #[test]
    fn lexes_scientific_notation() {
        let tokens = lex("1.5e-3").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Real(_)));
    }

    #[test]
    fn lexes_string_escapes() {
        let tokens = lex("\"a\\nb\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn unterminated_string_is_a_parse_error() {
        let err = lex("\"abc").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ParseError { .. }));
    }
}
