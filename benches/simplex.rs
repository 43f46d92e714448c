use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use twophase::bench_util::dense_seeded;
use twophase::{Method, SolverConfig};

fn dense(c: &mut Criterion) {
    let config = SolverConfig::default();
    let mut group = c.benchmark_group("dense");
    for &(rows, cols) in [(10, 20), (20, 40), (40, 80)].iter() {
        let problem = dense_seeded(rows, cols, 1337);
        for &method in [Method::TwoPhase, Method::Dual].iter() {
            let id = BenchmarkId::new(method.name(), format!("{}x{}", rows, cols));
            group.bench_with_input(id, &problem, |b, problem| {
                b.iter(|| {
                    method.solve(problem, &config)
                        .expect("Solve should not fail")
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, dense);
criterion_main!(benches);
