use criterion::{criterion_group, criterion_main, Criterion};
use grafcore::forest::BalancedForest;
use grafcore::heaps::FibHeaps;
use std::cmp::Ordering;
use std::hint::black_box;

fn build_balanced_forest(n: usize) -> BalancedForest {
    let mut bf = BalancedForest::new(n);
    let key: Vec<f64> = (0..=n).map(|i| ((i * 2654435761) % 1_000_003) as f64).collect();
    let mut root = 0;
    for u in 1..=n {
        let k = &key;
        root = bf.insert_by_key(u, root, |a, b| {
            k[a].partial_cmp(&k[b]).unwrap_or(Ordering::Equal)
        });
    }
    bf
}

fn bench_balanced_forest_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("balanced_forest_insert");
    for &n in &[10, 100, 1_000, 10_000] {
        group.bench_with_input(format!("insert_{n}"), &n, |b, &n| {
            b.iter(|| black_box(build_balanced_forest(n)));
        });
    }
    group.finish();
}

fn bench_fib_heap_insert_deletemin(c: &mut Criterion) {
    let mut group = c.benchmark_group("fib_heap_insert_deletemin");
    for &n in &[10, 100, 1_000, 10_000] {
        group.bench_with_input(format!("roundtrip_{n}"), &n, |b, &n| {
            b.iter(|| {
                let mut h = FibHeaps::new(n);
                let mut root = 0;
                for u in 1..=n {
                    let k = ((u * 2654435761) % 1_000_003) as f64;
                    root = h.insert(u, root, k);
                }
                for _ in 0..n {
                    let (_min, next) = h.deletemin(root);
                    root = next;
                }
                black_box(root);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_balanced_forest_insert,
    bench_fib_heap_insert_deletemin
);
criterion_main!(benches);
