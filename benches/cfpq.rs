use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rsmql::cfg::{Cfg, CfgSymbol, Production};
use rsmql::cfpq::{hellings, matrix};
use rsmql::loader::build_two_cycles;

fn balanced_grammar() -> Cfg {
    Cfg::new(
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
    )
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cfpq");
    group.measurement_time(Duration::from_secs(10)).sample_size(30);

    let cfg = balanced_grammar();
    for &size in &[8u32, 16, 32] {
        let graph = build_two_cycles(size, size, ("a", "b"));
        group.bench_function(format!("hellings two_cycles({size})"), |b| {
            b.iter(|| hellings(black_box(&cfg), black_box(&graph)))
        });
        group.bench_function(format!("matrix two_cycles({size})"), |b| {
            b.iter(|| matrix(black_box(&cfg), black_box(&graph)))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
