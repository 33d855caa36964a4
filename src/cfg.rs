//! Context-free grammars and their conversion to Weak Chomsky Normal Form
//! (WCNF: `A -> B C | a | epsilon`, unlike CNF unit productions and the
//! start symbol may appear in bodies).

use ahash::{AHashMap, AHashSet};

/// A symbol in a CFG production: either a terminal or a nonterminal name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CfgSymbol {
    /// A terminal (graph edge label).
    Terminal(String),
    /// A nonterminal name.
    Nonterminal(String),
}

/// One production `lhs -> body` (`body` empty means an epsilon production).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    /// The nonterminal being defined.
    pub lhs: String,
    /// The right-hand side, as a sequence of symbols (empty = epsilon).
    pub body: Vec<CfgSymbol>,
}

/// A context-free grammar: a start symbol and a production set.
#[derive(Debug, Clone)]
pub struct Cfg {
    /// The start nonterminal.
    pub start: String,
    /// All productions, grouped by nothing in particular — order is
    /// preserved from construction for deterministic `to_wcnf` output.
    pub productions: Vec<Production>,
}

impl Cfg {
    /// Builds a CFG from its start symbol and production list.
    pub fn new(start: impl Into<String>, productions: Vec<Production>) -> Self {
        Self {
            start: start.into(),
            productions,
        }
    }

    /// Replaces every production whose body is a single nonterminal
    /// (`A -> B`) with copies of whatever `B` transitively unit-reduces to,
    /// so the result has no unit productions left. Cycles (`A -> B`,
    /// `B -> A`) are handled by closing over reachability rather than
    /// recursing, so they simply collapse instead of looping.
    fn eliminate_unit_productions(&self) -> Vec<Production> {
        let mut unit_targets: AHashMap<String, Vec<String>> = AHashMap::default();
        for p in &self.productions {
            if let [CfgSymbol::Nonterminal(target)] = p.body.as_slice() {
                unit_targets
                    .entry(p.lhs.clone())
                    .or_default()
                    .push(target.clone());
            }
        }

        let nonterminals = self.all_nonterminals();
        let mut unit_closure: AHashMap<String, AHashSet<String>> = AHashMap::default();
        for nt in &nonterminals {
            let mut reached: AHashSet<String> = AHashSet::default();
            reached.insert(nt.clone());
            let mut frontier = vec![nt.clone()];
            while let Some(cur) = frontier.pop() {
                if let Some(targets) = unit_targets.get(&cur) {
                    for target in targets {
                        if reached.insert(target.clone()) {
                            frontier.push(target.clone());
                        }
                    }
                }
            }
            unit_closure.insert(nt.clone(), reached);
        }

        let mut result = Vec::new();
        for nt in &nonterminals {
            for reached in &unit_closure[nt] {
                for p in &self.productions {
                    if &p.lhs == reached && !matches!(p.body.as_slice(), [CfgSymbol::Nonterminal(_)])
                    {
                        result.push(Production {
                            lhs: nt.clone(),
                            body: p.body.clone(),
                        });
                    }
                }
            }
        }
        result
    }

    fn nonterminals(&self) -> AHashSet<String> {
        let mut set: AHashSet<String> = AHashSet::default();
        set.insert(self.start.clone());
        for p in &self.productions {
            set.insert(p.lhs.clone());
        }
        set
    }

    /// Converts to Weak Chomsky Normal Form: every body is either empty
    /// (epsilon), a single terminal, or exactly two nonterminals. Unlike
    /// strict CNF, epsilon productions are kept as-is (no epsilon-removal
    /// pass) and the start symbol is allowed on the right of a production,
    /// since WCNF's purpose here is only to make the CFPQ solvers' binary
    /// dispatch total, not to normalize the language in other ways.
    pub fn to_wcnf(&self) -> Cfg {
        // Step 1: eliminate unit productions (`A -> B`, a lone nonterminal)
        // by replacing each with copies of whatever `B` transitively unit-
        // reduces to, so later steps never see a length-1 nonterminal body.
        let unit_free = self.eliminate_unit_productions();

        // Step 2: remove useless (unreachable or non-generating) symbols,
        // so terminal-proxying and binarization never touch dead productions.
        let unit_free = unit_free.remove_useless_symbols();

        let mut fresh_counter = 0u32;
        let mut fresh_name = |prefix: &str| {
            fresh_counter += 1;
            format!("{prefix}#{fresh_counter}")
        };

        // Step 3: replace terminals inside length->=2 bodies with a fresh
        // nonterminal that derives exactly that terminal.
        let mut terminal_proxies: AHashMap<String, String> = AHashMap::default();
        let mut new_productions: Vec<Production> = Vec::new();

        let mut proxy_for = |term: &str,
                              proxies: &mut AHashMap<String, String>,
                              extra: &mut Vec<Production>,
                              counter: &mut u32| {
            proxies
                .entry(term.to_string())
                .or_insert_with(|| {
                    *counter += 1;
                    let name = format!("T#{counter}");
                    extra.push(Production {
                        lhs: name.clone(),
                        body: vec![CfgSymbol::Terminal(term.to_string())],
                    });
                    name
                })
                .clone()
        };

        let mut binarized: Vec<Production> = Vec::new();
        for p in &unit_free {
            match p.body.len() {
                0 | 1 => binarized.push(p.clone()),
                _ => {
                    let mut symbols: Vec<CfgSymbol> = Vec::with_capacity(p.body.len());
                    for sym in &p.body {
                        match sym {
                            CfgSymbol::Terminal(t) => {
                                let proxy = proxy_for(
                                    t,
                                    &mut terminal_proxies,
                                    &mut new_productions,
                                    &mut fresh_counter,
                                );
                                symbols.push(CfgSymbol::Nonterminal(proxy));
                            }
                            other => symbols.push(other.clone()),
                        }
                    }
                    binarized.push(Production {
                        lhs: p.lhs.clone(),
                        body: symbols,
                    });
                }
            }
        }

        // Step 4: binarize bodies longer than 2 via fresh right-nested
        // nonterminals, e.g. `A -> B C D` becomes `A -> B A#1`, `A#1 -> C D`.
        let mut final_productions: Vec<Production> = Vec::new();
        for p in binarized {
            if p.body.len() <= 2 {
                final_productions.push(p);
                continue;
            }
            let mut symbols = p.body;
            let mut lhs = p.lhs;
            while symbols.len() > 2 {
                let rest = symbols.split_off(1);
                let tail_name = fresh_name("B");
                final_productions.push(Production {
                    lhs: lhs.clone(),
                    body: vec![symbols[0].clone(), CfgSymbol::Nonterminal(tail_name.clone())],
                });
                symbols = rest;
                lhs = tail_name;
            }
            final_productions.push(Production { lhs, body: symbols });
        }

        final_productions.extend(new_productions);

        Cfg {
            start: self.start.clone(),
            productions: final_productions,
        }
    }

    /// Removes nonterminals that can never derive any terminal string
    /// (unproductive) or are never reachable from the start symbol.
    pub fn remove_useless_symbols(&self) -> Cfg {
        let productive = self.productive_symbols();
        let reachable = self.reachable_symbols(&productive);

        let productions = self
            .productions
            .iter()
            .filter(|p| {
                reachable.contains(&p.lhs)
                    && p.body.iter().all(|s| match s {
                        CfgSymbol::Nonterminal(n) => reachable.contains(n),
                        CfgSymbol::Terminal(_) => true,
                    })
            })
            .cloned()
            .collect();

        Cfg {
            start: self.start.clone(),
            productions,
        }
    }

    fn productive_symbols(&self) -> AHashSet<String> {
        let mut productive: AHashSet<String> = AHashSet::default();
        loop {
            let mut changed = false;
            for p in &self.productions {
                if productive.contains(&p.lhs) {
                    continue;
                }
                let ok = p.body.iter().all(|s| match s {
                    CfgSymbol::Terminal(_) => true,
                    CfgSymbol::Nonterminal(n) => productive.contains(n),
                });
                if ok {
                    productive.insert(p.lhs.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        productive
    }

    fn reachable_symbols(&self, productive: &AHashSet<String>) -> AHashSet<String> {
        let mut reachable: AHashSet<String> = AHashSet::default();
        if productive.contains(&self.start) {
            reachable.insert(self.start.clone());
        }
        loop {
            let mut changed = false;
            for p in &self.productions {
                if !reachable.contains(&p.lhs) {
                    continue;
                }
                for s in &p.body {
                    if let CfgSymbol::Nonterminal(n) = s {
                        if productive.contains(n) && reachable.insert(n.clone()) {
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
        reachable
    }

    /// All nonterminal names appearing anywhere (as LHS or in a body).
    pub fn all_nonterminals(&self) -> AHashSet<String> {
        let mut set = self.nonterminals();
        for p in &self.productions {
            for s in &p.body {
                if let CfgSymbol::Nonterminal(n) = s {
                    set.insert(n.clone());
                }
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wcnf_bodies_are_short() {
        let cfg = Cfg::new(
            "S",
            vec![Production {
                lhs: "S".to_string(),
                body: vec![
                    CfgSymbol::Terminal("a".to_string()),
                    CfgSymbol::Terminal("b".to_string()),
                    CfgSymbol::Terminal("c".to_string()),
                ],
            }],
        );
        let wcnf = cfg.to_wcnf();
        for p in &wcnf.productions {
            assert!(p.body.len() <= 2, "{p:?} has a body longer than 2");
            if p.body.len() == 2 {
                assert!(p
                    .body
                    .iter()
                    .all(|s| matches!(s, CfgSymbol::Nonterminal(_))));
            }
        }
    }

    #[test]
    fn useless_symbols_are_removed() {
        let cfg = Cfg::new(
            "S",
            vec![
                Production {
                    lhs: "S".to_string(),
                    body: vec![CfgSymbol::Terminal("a".to_string())],
                },
                Production {
                    lhs: "Unreachable".to_string(),
                    body: vec![CfgSymbol::Terminal("z".to_string())],
                },
                Production {
                    lhs: "Unproductive".to_string(),
                    body: vec![CfgSymbol::Nonterminal("Unproductive".to_string())],
                },
            ],
        );
        let trimmed = cfg.remove_useless_symbols();
        let lhss: AHashSet<&str> = trimmed.productions.iter().map(|p| p.lhs.as_str()).collect();
        assert!(lhss.contains("S"));
        assert!(!lhss.contains("Unreachable"));
        assert!(!lhss.contains("Unproductive"));
    }

    #[test]
    fn unit_productions_are_eliminated() {
        let cfg = Cfg::new(
            "S",
            vec![
                Production {
                    lhs: "S".to_string(),
                    body: vec![CfgSymbol::Nonterminal("A".to_string())],
                },
                Production {
                    lhs: "A".to_string(),
                    body: vec![CfgSymbol::Terminal("a".to_string())],
                },
            ],
        );
        let wcnf = cfg.to_wcnf();
        assert!(wcnf.productions.iter().any(|p| p.lhs == "S"
            && p.body == vec![CfgSymbol::Terminal("a".to_string())]));
        assert!(!wcnf.productions.iter().any(|p| matches!(
            p.body.as_slice(),
            [CfgSymbol::Nonterminal(_)]
        )));
    }

    #[test]
    fn unit_production_cycles_do_not_loop() {
        let cfg = Cfg::new(
            "A",
            vec![
                Production {
                    lhs: "A".to_string(),
                    body: vec![CfgSymbol::Nonterminal("B".to_string())],
                },
                Production {
                    lhs: "B".to_string(),
                    body: vec![CfgSymbol::Nonterminal("A".to_string())],
                },
                Production {
                    lhs: "B".to_string(),
                    body: vec![CfgSymbol::Terminal("b".to_string())],
                },
            ],
        );
        let wcnf = cfg.to_wcnf();
        assert!(wcnf.productions.iter().any(|p| p.lhs == "A"
            && p.body == vec![CfgSymbol::Terminal("b".to_string())]));
    }

    #[test]
    fn wcnf_drops_useless_symbols() {
        let cfg = Cfg::new(
            "S",
            vec![
                Production {
                    lhs: "S".to_string(),
                    body: vec![CfgSymbol::Terminal("a".to_string())],
                },
                Production {
                    lhs: "Unreachable".to_string(),
                    body: vec![CfgSymbol::Terminal("z".to_string())],
                },
            ],
        );
        let wcnf = cfg.to_wcnf();
        assert!(!wcnf.productions.iter().any(|p| p.lhs == "Unreachable"));
    }

    #[test]
    fn epsilon_productions_survive_wcnf() {
        let cfg = Cfg::new(
            "S",
            vec![Production {
                lhs: "S".to_string(),
                body: vec![],
            }],
        );
        let wcnf = cfg.to_wcnf();
        assert_eq!(wcnf.productions.len(), 1);
        assert!(wcnf.productions[0].body.is_empty());
    }
}
