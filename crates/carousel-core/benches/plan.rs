use carousel_core::{PlanConfig, StyleSpec, WeightTable, plan};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

/// Dense row-stochastic table with a deterministic, uneven weight pattern.
fn dense_table(n: usize) -> WeightTable {
    let labels: Vec<String> = (0..n).map(|i| format!("state-{i}")).collect();
    let values = (0..n)
        .map(|i| {
            let raw: Vec<f64> = (0..n).map(|j| ((i * 7 + j * 3) % 5) as f64).collect();
            let total: f64 = raw.iter().sum::<f64>().max(1.0);
            raw.into_iter().map(|v| v / total).collect()
        })
        .collect();
    WeightTable::from_matrix(labels, values).expect("square table")
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    group.measurement_time(Duration::from_secs(3));

    let config = PlanConfig {
        edge_labels: StyleSpec::Auto,
        ..Default::default()
    };
    for n in [4usize, 16, 64] {
        let table = dense_table(n);
        group.bench_with_input(BenchmarkId::new("dense", n), &table, |b, table| {
            b.iter(|| {
                let p = plan(black_box(table), black_box(&config)).expect("plan");
                black_box(p.commands.len());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
