//! Criterion benchmarks for warpsearch-dtw: exact, abandoned and seeded DTW, and the lower bounds.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use warpsearch_dtw::{BoundedDtw, Envelope, SeriesStats, TimeSeries, Window, lb_keogh, lb_kim};

fn make_sine_series(n: usize, phase: f64) -> TimeSeries {
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1 + phase).sin()).collect();
    TimeSeries::new(values).unwrap()
}

fn bench_dtw_cost(c: &mut Criterion) {
    let mut group = c.benchmark_group("dtw_cost");

    for &len in &[64usize, 256, 1024] {
        for &radius in &[2usize, 10, 50] {
            let id = BenchmarkId::new(format!("len{len}"), format!("w{radius}"));
            let a = make_sine_series(len, 0.0);
            let b = make_sine_series(len, 0.7);
            let dtw = BoundedDtw::with_radius(radius);

            group.bench_with_input(id, &(a, b, dtw), |bencher, (a, b, dtw)| {
                bencher.iter(|| dtw.cost(a.as_view(), b.as_view()));
            });
        }
    }

    group.finish();
}

fn bench_dtw_abandoning(c: &mut Criterion) {
    let a = make_sine_series(512, 0.0);
    let b = make_sine_series(512, 1.5);
    let dtw = BoundedDtw::with_radius(20);
    let exact = dtw.cost(a.as_view(), b.as_view()).cost().value();

    let mut group = c.benchmark_group("dtw_abandoning_512_w20");
    for &(label, fraction) in &[("cutoff_10pct", 0.1), ("cutoff_50pct", 0.5), ("cutoff_exact", 1.0)] {
        group.bench_function(label, |bencher| {
            bencher.iter(|| dtw.cost_with_cutoff(a.as_view(), b.as_view(), exact * fraction));
        });
    }
    let seed = BoundedDtw::with_radius(10).cost(a.as_view(), b.as_view());
    group.bench_function("seeded_from_w10", |bencher| {
        bencher.iter(|| dtw.cost_seeded(a.as_view(), b.as_view(), &seed));
    });
    group.finish();
}

fn bench_lower_bounds(c: &mut Criterion) {
    let a = make_sine_series(512, 0.0);
    let b = make_sine_series(512, 0.4);
    let env = Envelope::compute(b.as_view(), Window::new(20));
    let sa = SeriesStats::compute(a.as_view());
    let sb = SeriesStats::compute(b.as_view());

    c.bench_function("envelope_512_w20", |bencher| {
        bencher.iter(|| Envelope::compute(b.as_view(), Window::new(20)));
    });
    c.bench_function("lb_keogh_512_w20", |bencher| {
        bencher.iter(|| lb_keogh(a.as_slice(), &env));
    });
    c.bench_function("lb_kim", |bencher| {
        bencher.iter(|| lb_kim(&sa, &sb));
    });
}

criterion_group!(benches, bench_dtw_cost, bench_dtw_abandoning, bench_lower_bounds);
criterion_main!(benches);
