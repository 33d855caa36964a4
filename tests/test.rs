#[cfg(test)]
mod tests {
    use ahash::AHashSet;
    use insta::assert_snapshot;

    use rsmql::ast::BinOp;
    use rsmql::cfg::{Cfg, CfgSymbol, Production};
    use rsmql::cfpq::{cfpq_filter, hellings, matrix};
    use rsmql::config::InternalConfig;
    use rsmql::dot::fa_to_dot;
    use rsmql::ecfg::Ecfg;
    use rsmql::error::ErrorKind;
    use rsmql::fa::{Fa, Symbol};
    use rsmql::interpreter::Interpreter;
    use rsmql::loader::build_two_cycles;
    use rsmql::parser::parse_program;
    use rsmql::regex::compile_to_dfa;

    fn run(src: &str) -> Vec<String> {
        let program = parse_program(src).unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let mut out = Vec::new();
        interp.run(&program, |s| out.push(s)).unwrap();
        out
    }

    /// Scenario 1: simple arithmetic and string expressions print their
    /// evaluated form.
    #[test]
    fn scenario_simple_expressions_print() {
        assert_eq!(run("1 + 2; \"a\" + \"b\";"), vec!["3", "\"ab\""]);
    }

    /// Scenario 2: a regex query against a graph-lifted FA finds the
    /// expected Kronecker-product reachable pairs.
    #[test]
    fn scenario_regex_query_reachability() {
        let graph = build_two_cycles(2, 2, ("a", "b"));
        let graph_fa = Fa::from_graph(&graph, None, None);
        let regex_dfa = compile_to_dfa("a a a").unwrap(); // around the first cycle once
        let start: AHashSet<usize> = [0].into_iter().collect();
        let reachable = rsmql::fa::regexp_reachability(&regex_dfa, &graph_fa, &start);
        assert!(reachable.contains(&0));
    }

    /// Scenario 3: CFPQ over two cycles via both solvers agrees.
    #[test]
    fn scenario_cfpq_basic_two_cycles() {
        let cfg = Cfg::new(
            "S",
            vec![
                Production {
                    lhs: "S".to_string(),
                    body: vec![
                        CfgSymbol::Terminal("a".to_string()),
                        CfgSymbol::Nonterminal("S1".to_string()),
                    ],
                },
                Production {
                    lhs: "S1".to_string(),
                    body: vec![
                        CfgSymbol::Nonterminal("S".to_string()),
                        CfgSymbol::Nonterminal("B".to_string()),
                    ],
                },
                Production {
                    lhs: "B".to_string(),
                    body: vec![CfgSymbol::Terminal("b".to_string())],
                },
                Production {
                    lhs: "S".to_string(),
                    body: vec![],
                },
            ],
        );
        let graph = build_two_cycles(2, 2, ("a", "b"));
        let h = hellings(&cfg, &graph);
        let m = matrix(&cfg, &graph);
        assert_eq!(
            cfpq_filter(&h, "S", None, None),
            cfpq_filter(&m, "S", None, None)
        );
    }

    /// Scenario 3b: the tensor-product RSM intersection (`rsm.rs`) and the
    /// worklist CFPQ solver agree on the same grammar/graph pair, projected
    /// on the start nonterminal.
    #[test]
    fn scenario_rsm_intersection_matches_hellings() {
        let cfg = Cfg::new(
            "S",
            vec![
                Production {
                    lhs: "S".to_string(),
                    body: vec![
                        CfgSymbol::Terminal("a".to_string()),
                        CfgSymbol::Nonterminal("S".to_string()),
                        CfgSymbol::Terminal("b".to_string()),
                    ],
                },
                Production {
                    lhs: "S".to_string(),
                    body: vec![],
                },
            ],
        );
        let graph = build_two_cycles(1, 1, ("a", "b"));
        let graph_fa = Fa::from_graph(&graph, None, None);
        let ecfg = Ecfg::parse("S -> a S b | epsilon", &["S"]).unwrap();
        let rsm = ecfg.to_rsm();
        let relation = rsm.intersect_with_fa(&graph_fa);
        let tensor_edges: AHashSet<(usize, usize)> = {
            let m = &relation[rsm.start()];
            (0..graph_fa.num_states())
                .flat_map(|i| m.row_ones(i).map(move |j| (i, j)))
                .collect()
        };

        let h = hellings(&cfg, &graph);
        let hellings_edges: AHashSet<(usize, usize)> = cfpq_filter(&h, "S", None, None)
            .into_iter()
            .map(|(u, v)| (u as usize, v as usize))
            .collect();

        assert_eq!(tensor_edges, hellings_edges);
    }

    /// Scenario 4: `mapped with`/`filtered with` over a set literal.
    #[test]
    fn scenario_map_filter_pipeline() {
        let out = run("({1, 2, 3} mapped with \\x -> x + 1 filtered with \\x -> x > 2);");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], "{3, 4}");
    }

    /// Scenario 5: a type error is stamped with the offending operator's
    /// source location.
    #[test]
    fn scenario_type_error_reports_location() {
        let program = parse_program("not 1;").unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let err = interp.run(&program, |_| {}).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TypeError { .. }));
        assert_eq!(err.span.line, 1);
        // Points at the operand `1`, not the `not` operator.
        assert_eq!(err.span.column, 5);
    }

    /// Scenario 6: the `with`/`of` builder and accessor forms round-trip.
    #[test]
    fn scenario_with_builder_semantics() {
        let out = run("let g = \"a\" + \"b\"; start states of (g with only start states {0, 1});");
        assert_eq!(out[0], "{0, 1}");
    }

    #[test]
    fn ecfg_compiles_to_an_rsm_box_per_nonterminal() {
        let ecfg = Ecfg::parse("S -> a S b | epsilon", &["S"]).unwrap();
        let rsm = ecfg.to_rsm();
        assert!(rsm.box_for("S").is_some());
    }

    #[test]
    fn regex_fa_equivalence_property() {
        let dfa = compile_to_dfa("(a | b)*").unwrap();
        assert!(dfa.accepts(&[]));
        assert!(dfa.accepts(&["a", "b", "a"]));
        assert!(!dfa.accepts(&["c"]));
    }

    #[test]
    fn algebra_union_is_commutative_in_language() {
        let a = Fa::singleton(Symbol::terminal("a"));
        let b = Fa::singleton(Symbol::terminal("b"));
        let ab = Fa::union(&a, &b).determinize().minimize();
        let ba = Fa::union(&b, &a).determinize().minimize();
        assert_eq!(ab.num_states(), ba.num_states());
    }

    #[test]
    fn scope_hygiene_lambda_params_shadow_outer_bindings() {
        let out = run("let x = 1; (\\x -> x + 1)(10);");
        assert_eq!(out[0], "11");
    }

    #[test]
    fn binop_parses_every_comparison_operator() {
        for (src, op) in [
            ("1 == 1;", BinOp::Eq),
            ("1 != 2;", BinOp::NotEq),
            ("1 < 2;", BinOp::Lt),
            ("1 <= 2;", BinOp::LtEq),
            ("2 > 1;", BinOp::Gt),
            ("2 >= 1;", BinOp::GtEq),
        ] {
            let program = parse_program(src).unwrap();
            match &program.statements[0] {
                rsmql::ast::Stmt::Print { value: rsmql::ast::Expr::BinOp { op: parsed, .. }, .. } => {
                    assert_eq!(*parsed, op);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn bitwise_and_or_are_distinct_from_logical_and_or() {
        assert_eq!(run("3 & 5;"), vec!["1"]);
        assert_eq!(run("3 | 5;"), vec!["7"]);
        assert_eq!(run("true and false;"), vec!["false"]);
        assert_eq!(run("true or false;"), vec!["true"]);
    }

    #[test]
    fn tuple_pattern_lambda_destructures_positionally() {
        let out = run("(\\(x, y) -> x + y)((3, 4));");
        assert_eq!(out[0], "7");
    }

    #[test]
    fn named_rec_token_intersects_with_an_fa() {
        let program = parse_program("rec S & load \"two_cycles\";").unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        assert!(interp.run(&program, |_| {}).is_ok());
    }

    #[test]
    fn composite_rsm_intersection_with_an_fa_is_not_implemented() {
        let program = parse_program("(rec S | rec T) & load \"two_cycles\";").unwrap();
        let mut interp = Interpreter::new(InternalConfig::default());
        let err = interp.run(&program, |_| {}).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotImplemented(_)));
    }

    #[test]
    fn dot_output_of_a_union_automaton_is_stable() {
        let fa = Fa::union(
            &Fa::singleton(Symbol::terminal("a")),
            &Fa::singleton(Symbol::terminal("b")),
        );
        assert_snapshot!(fa_to_dot(&fa, "g"));
    }
}
