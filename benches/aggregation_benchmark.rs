use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sahel_raster::models::Grid;
use sahel_raster::processors::{MaskPolicy, RegionalAggregator, Statistic, ValueHistogram};

const SENTINEL: f64 = -3.4028235e38;

// Precipitation-like grid with a sentinel border and scattered fill values
fn create_test_grid(rows: usize, cols: usize) -> Grid {
    let values = (0..rows * cols)
        .map(|i| {
            let (r, c) = (i / cols, i % cols);
            if r == 0 || c == 0 {
                SENTINEL
            } else if i % 97 == 0 {
                65533.0
            } else {
                (r as f64 * 0.37 + c as f64 * 0.11) % 250.0
            }
        })
        .collect();
    Grid::from_vec(rows, cols, values).unwrap()
}

fn create_land_cover_grid(rows: usize, cols: usize) -> Grid {
    let values = (0..rows * cols).map(|i| ((i * 7) % 17) as f64).collect();
    Grid::from_vec(rows, cols, values).unwrap()
}

fn benchmark_masking(c: &mut Criterion) {
    let raw = create_test_grid(500, 500);
    let policy = MaskPolicy::default();

    c.bench_function("mask_500x500", |b| {
        b.iter(|| black_box(policy.apply_to_grid(&raw).valid_cells()))
    });
}

fn benchmark_regional_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("regional_mean_by_size");
    let aggregator = RegionalAggregator::default();

    for &size in &[100, 500, 1000] {
        let grid = MaskPolicy::default().apply_to_grid(&create_test_grid(size, size));
        group.bench_with_input(BenchmarkId::new("cells", size * size), &grid, |b, grid| {
            b.iter(|| black_box(aggregator.regional(grid, Statistic::Mean).unwrap()))
        });
    }

    group.finish();
}

fn benchmark_category_histogram(c: &mut Criterion) {
    let grid = create_land_cover_grid(1000, 1000);
    let aggregator = RegionalAggregator::default();

    c.bench_function("category_histogram_1000x1000", |b| {
        b.iter(|| black_box(aggregator.category_histogram(&grid).len()))
    });
}

fn benchmark_difference_and_histogram(c: &mut Criterion) {
    let aggregator = RegionalAggregator::default();
    let first = MaskPolicy::default().apply_to_grid(&create_test_grid(500, 500));
    let second = first.map(|v| v * 1.1 + 0.5);

    c.bench_function("difference_500x500", |b| {
        b.iter(|| black_box(aggregator.difference(&first, &second).unwrap().valid_cells()))
    });

    let difference = aggregator.difference(&first, &second).unwrap();
    c.bench_function("value_histogram_50_bins", |b| {
        b.iter(|| black_box(ValueHistogram::from_grid(&difference, 50).map(|h| h.total())))
    });
}

fn benchmark_describe(c: &mut Criterion) {
    let grid = MaskPolicy::default().apply_to_grid(&create_test_grid(500, 500));
    let aggregator = RegionalAggregator::default();

    c.bench_function("describe_500x500", |b| {
        b.iter(|| black_box(aggregator.describe(&grid)))
    });
}

criterion_group!(
    benches,
    benchmark_masking,
    benchmark_regional_mean,
    benchmark_category_histogram,
    benchmark_difference_and_histogram,
    benchmark_describe
);
criterion_main!(benches);
