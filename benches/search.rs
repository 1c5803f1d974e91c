use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use kyrolearn::{
    BottomClauseBuilder, Example, Expr, HypothesisSearch, InverseEntailmentEngine, SearchConfig,
};

/// `((v0 + v1) + v2) + ...` over `n` leaves, wrapped as an example pair.
fn example(tag: usize, leaves: usize) -> Example {
    let chain = |prefix: &str| {
        (1..leaves).fold(Expr::var(format!("{prefix}0")), |acc, i| {
            Expr::add(acc, Expr::var(format!("{prefix}{i}")))
        })
    };
    let prefix = format!("v{tag}_");
    Example::pair(chain(&prefix), Expr::mul(Expr::var("k"), chain(&prefix)))
}

fn bench_hypothesis_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search/beam");
    for max_clause_length in [2usize, 4, 6, 8] {
        let config = SearchConfig {
            max_clause_length,
            early_exit_after: usize::MAX,
            ..SearchConfig::default()
        };
        let positives: Vec<Example> = (0..8).map(|i| example(i, 12)).collect();
        let negatives: Vec<Example> = (0..4)
            .map(|i| Example::pair(Expr::var(format!("n{i}")), Expr::var(format!("n{i}"))).negative())
            .collect();
        let bottom = BottomClauseBuilder::new(&config)
            .build(&positives[0], &[])
            .expect("seed has a head literal");
        let search = HypothesisSearch::new(config);

        group.throughput(Throughput::Elements(positives.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(max_clause_length), &bottom, |b, bottom| {
            b.iter(|| search.run(black_box(bottom), &positives, &negatives, &[]));
        });
    }
    group.finish();
}

fn bench_learn_clause(c: &mut Criterion) {
    let positives: Vec<Example> = (0..6).map(|i| example(i, 6)).collect();
    c.bench_function("search/learn_clause", |b| {
        b.iter(|| {
            let mut engine = InverseEntailmentEngine::default();
            black_box(engine.learn_clause(&positives, &[], &[]))
        });
    });
}

criterion_group!(benches, bench_hypothesis_search, bench_learn_clause);
criterion_main!(benches);
