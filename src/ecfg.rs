//! Extended context-free grammars: one regex per nonterminal, written one
//! production per line as `N -> R`. Compiles directly to an
//! [`Rsm`] (one box per nonterminal, `Nonterminal` symbols in box bodies
//! referencing other lines).

use ahash::AHashMap;
use nom::bytes::complete::{tag, take_until};

use crate::error::{ErrorKind, RsmqlError, Span};
use crate::fa::{Fa, Symbol};
use crate::regex::{self, Regex};
use crate::rsm::Rsm;

/// A single `N -> R` line.
#[derive(Debug, Clone)]
pub struct EcfgProduction {
    /// The nonterminal this line defines.
    pub lhs: String,
    /// The regex body, already parsed.
    pub body: Regex,
}

/// An extended CFG: a start nonterminal and exactly one regex body per
/// nonterminal.
#[derive(Debug, Clone)]
pub struct Ecfg {
    start: String,
    productions: AHashMap<String, Regex>,
}

impl Ecfg {
    /// Parses `source`, one `N -> R` production per non-blank line. The
    /// first line's LHS is the start nonterminal. Rejects duplicate LHS
    /// names and malformed lines with a `GrammarError`.
    ///
    /// A grammar's own LHS names are always treated as nonterminal
    /// references in every body, even if they appear lower in the source
    /// than the line that refers to them; `known_nonterminals` only adds
    /// further names (e.g. boxes defined by an enclosing grammar) on top
    /// of that auto-detected set.
    pub fn parse(source: &str, known_nonterminals: &[&str]) -> Result<Ecfg, RsmqlError> {
        let lines: Vec<(usize, &str)> = source
            .lines()
            .enumerate()
            .map(|(i, line)| (i, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .collect();

        let mut lhs_names: Vec<String> = Vec::new();
        for (lineno, line) in &lines {
            let Some((lhs_part, _)) = split_production_line(line) else {
                return Err(RsmqlError::new(
                    ErrorKind::GrammarError(format!(
                        "line {}: expected `N -> R`, found `{line}`",
                        lineno + 1
                    )),
                    Span::default(),
                ));
            };
            let lhs = lhs_part.trim().to_string();
            if lhs.is_empty() {
                return Err(RsmqlError::new(
                    ErrorKind::GrammarError(format!("line {}: empty left-hand side", lineno + 1)),
                    Span::default(),
                ));
            }
            lhs_names.push(lhs);
        }
        let all_known: Vec<&str> = lhs_names
            .iter()
            .map(String::as_str)
            .chain(known_nonterminals.iter().copied())
            .collect();

        let mut productions: AHashMap<String, Regex> = AHashMap::default();
        let mut start: Option<String> = None;

        for (lhs, line) in lhs_names.iter().zip(lines.iter()) {
            let (_, rhs_part) = split_production_line(line.1).unwrap();
            if productions.contains_key(lhs) {
                return Err(RsmqlError::new(
                    ErrorKind::GrammarError(format!("duplicate production for `{lhs}`")),
                    Span::default(),
                ));
            }
            let body = parse_body(rhs_part.trim(), &all_known)?;
            if start.is_none() {
                start = Some(lhs.clone());
            }
            productions.insert(lhs.clone(), body);
        }

        let start = start.ok_or_else(|| {
            RsmqlError::new(
                ErrorKind::GrammarError("grammar has no productions".to_string()),
                Span::default(),
            )
        })?;

        if !productions.contains_key(&start) {
            return Err(RsmqlError::new(
                ErrorKind::GrammarError(format!("start nonterminal `{start}` is undefined")),
                Span::default(),
            ));
        }

        Ok(Ecfg { start, productions })
    }

    /// The start nonterminal.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Compiles to an [`Rsm`]: each regex body is Thompson-compiled to an
    /// NFA whose alphabet mixes terminal and `Nonterminal` symbols.
    pub fn to_rsm(&self) -> Rsm {
        let boxes: AHashMap<String, Fa> = self
            .productions
            .iter()
            .map(|(nt, regex)| (nt.clone(), regex.compile()))
            .collect();
        Rsm::new(self.start.clone(), boxes)
    }
}

/// Splits a `N -> R` line into its LHS and RHS parts. `None` if the line
/// has no `->` separator at all.
fn split_production_line(line: &str) -> Option<(&str, &str)> {
    let (rest, lhs): (&str, &str) = take_until::<_, _, nom::error::Error<&str>>("->")(line).ok()?;
    let (rhs, _) = tag::<_, _, nom::error::Error<&str>>("->")(rest).ok()?;
    Some((lhs, rhs))
}

/// A regex body that additionally recognizes bare nonterminal references
/// (any word matching an entry of `known_nonterminals` becomes a
/// `Symbol::Nonterminal` transition instead of a terminal one once
/// compiled); reuses `regex::parse` for the shared grammar and then
/// re-tags matching atoms.
fn parse_body(source: &str, known_nonterminals: &[&str]) -> Result<Regex, RsmqlError> {
    let regex = regex::parse(source)?;
    Ok(retag_nonterminals(regex, known_nonterminals))
}

fn retag_nonterminals(regex: Regex, known: &[&str]) -> Regex {
    match regex {
        Regex::Symbol(s) if known.contains(&s.as_str()) => Regex::NonterminalRef(s),
        Regex::Union(a, b) => Regex::Union(
            Box::new(retag_nonterminals(*a, known)),
            Box::new(retag_nonterminals(*b, known)),
        ),
        Regex::Concat(a, b) => Regex::Concat(
            Box::new(retag_nonterminals(*a, known)),
            Box::new(retag_nonterminals(*b, known)),
        ),
        Regex::Star(a) => Regex::Star(Box::new(retag_nonterminals(*a, known))),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_from_first_line() {
        let ecfg = Ecfg::parse("S -> a S b | epsilon", &["S"]).unwrap();
        assert_eq!(ecfg.start(), "S");
    }

    #[test]
    fn duplicate_lhs_is_a_grammar_error() {
        let err = Ecfg::parse("S -> a\nS -> b", &["S"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::GrammarError(_)));
    }

    #[test]
    fn malformed_line_is_a_grammar_error() {
        let err = Ecfg::parse("S a", &["S"]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::GrammarError(_)));
    }

    #[test]
    fn nonterminal_references_compile_to_boxes() {
        let ecfg = Ecfg::parse("S -> a S b | epsilon", &["S"]).unwrap();
        let rsm = ecfg.to_rsm();
        assert!(rsm.box_for("S").is_some());
    }
}
