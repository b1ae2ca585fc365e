//! Criterion benchmarks for warpsearch-search: a full window sweep per strategy.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warpsearch_dtw::TimeSeries;
use warpsearch_search::{ClassLabel, Direction, SearchConfig, SequenceStore, Strategy};

fn make_store(n: usize, len: usize, n_classes: usize, seed: u64) -> SequenceStore {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut series = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % n_classes;
        let phase = class as f64 + rng.gen_range(-0.3..0.3);
        let values: Vec<f64> = (0..len)
            .map(|t| (t as f64 * 0.2 + phase).sin() + rng.gen_range(-0.2..0.2))
            .collect();
        series.push(TimeSeries::new(values).unwrap());
        labels.push(ClassLabel::new(class));
    }
    SequenceStore::new(series, labels).unwrap()
}

fn bench_sweep(c: &mut Criterion) {
    let store = make_store(60, 64, 3, 42);
    let mut group = c.benchmark_group("sweep_60x64_w16");
    group.sample_size(10);

    for strategy in Strategy::ALL {
        let config = SearchConfig::new()
            .with_strategy(strategy)
            .with_max_window(Some(16));
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &config, |b, config| {
            b.iter(|| config.search(&store).unwrap());
        });
    }
    group.finish();
}

fn bench_greedy_ascending(c: &mut Criterion) {
    let store = make_store(60, 64, 3, 7);
    let config = SearchConfig::new()
        .with_strategy(Strategy::EarlyAbandon)
        .with_direction(Direction::Ascending)
        .with_greedy(true);

    c.bench_function("greedy_ascending_early_abandon_60x64", |b| {
        b.iter(|| config.search(&store).unwrap());
    });
}

fn bench_classify(c: &mut Criterion) {
    let store = make_store(200, 128, 4, 11);
    let queries = make_store(50, 128, 4, 12).into_parts().0;
    let classifier = warpsearch_search::NearestNeighbor::new(store, warpsearch_dtw::Window::new(8));

    c.bench_function("classify_batch_50_vs_200x128_w8", |b| {
        b.iter(|| classifier.classify_batch(&queries).unwrap());
    });
}

criterion_group!(benches, bench_sweep, bench_greedy_ascending, bench_classify);
criterion_main!(benches);
