//! Benchmarks for resampling and offset calibration on synthetic hikes.
//!
//! Run with: `cargo bench --bench calibration --features synthetic`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use trailsync::synthetic::HikeScenario;
use trailsync::{CalibrationConfig, PlanarMetric, calibrate, mean_error_at_offset, resample};

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for (name, scenario) in [
        ("day_hike", HikeScenario::day_hike()),
        ("long_expedition", HikeScenario::long_expedition()),
    ] {
        let hike = scenario.generate();
        group.bench_with_input(
            BenchmarkId::new("reference", format!("{}_{}pts", name, hike.reference.len())),
            &hike.reference,
            |b, series| b.iter(|| resample(black_box(series))),
        );
        group.bench_with_input(
            BenchmarkId::new("photos", format!("{}_{}pts", name, hike.photos.len())),
            &hike.photos,
            |b, series| b.iter(|| resample(black_box(series))),
        );
    }

    group.finish();
}

fn bench_single_offset(c: &mut Criterion) {
    let hike = HikeScenario::long_expedition().generate();
    let source = resample(&hike.photos);
    let reference = resample(&hike.reference);
    let metric = PlanarMetric::at_latitude(hike.reference.first().map_or(0.0, |p| p.latitude));

    c.bench_function("mean_error_at_offset", |b| {
        b.iter(|| {
            mean_error_at_offset(
                black_box(&source),
                black_box(&reference),
                &metric,
                hike.clock_offset_s,
            )
        })
    });
}

fn bench_calibrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibrate");
    group.sample_size(10);

    for (name, scenario) in [
        ("day_hike", HikeScenario::day_hike()),
        ("noisy_trail", HikeScenario::noisy_trail()),
    ] {
        let hike = scenario.generate();
        let config = CalibrationConfig::default();
        group.bench_function(name, |b| {
            b.iter(|| calibrate(black_box(&hike.photos), black_box(&hike.reference), &config))
        });
    }

    // A clamped window is the common case when the clock error is roughly known
    let hike = HikeScenario::long_expedition().generate();
    let clamped = CalibrationConfig {
        max_abs_offset_s: Some(900),
        ..Default::default()
    };
    group.bench_function("long_expedition_clamped", |b| {
        b.iter(|| calibrate(black_box(&hike.photos), black_box(&hike.reference), &clamped))
    });

    group.finish();
}

criterion_group!(benches, bench_resample, bench_single_offset, bench_calibrate);
criterion_main!(benches);
