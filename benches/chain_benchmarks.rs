//! Chain Benchmarks
//!
//! Per-block cost of the audio path and of the observer side.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use simple_eq::analysis::SpectrumAnalyzer;
use simple_eq::engine::{spectral_fifo, ChainController, EqProcessor};
use simple_eq::params::{parameter_channel, ParameterSnapshot, Slope};

const FS: f64 = 48000.0;
const BLOCK: usize = 512;

fn steep_settings() -> ParameterSnapshot {
    ParameterSnapshot {
        low_cut_freq: 80.0,
        low_cut_slope: Slope::Db48,
        peak_freq: 2500.0,
        peak_gain_db: -4.5,
        peak_quality: 2.0,
        high_cut_freq: 12000.0,
        high_cut_slope: Slope::Db48,
    }
}

fn sine_block() -> Vec<f32> {
    (0..BLOCK)
        .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / FS as f32).sin())
        .collect()
}

fn benchmark_process_block(c: &mut Criterion) {
    let (_store, feed) = parameter_channel(steep_settings());
    let mut processor = EqProcessor::new(feed);
    let _taps = processor.prepare(FS, BLOCK).unwrap();
    let mut left = sine_block();
    let mut right = sine_block();

    c.bench_function("process_block_512_stereo_48db", |b| {
        b.iter(|| {
            processor
                .process_block(black_box(&mut left), black_box(&mut right))
                .unwrap();
        })
    });
}

fn benchmark_coefficient_design(c: &mut Criterion) {
    let settings = steep_settings();
    c.bench_function("design_all_coefficients", |b| {
        b.iter(|| ChainController::design(black_box(&settings), FS).unwrap())
    });
}

fn benchmark_fifo(c: &mut Criterion) {
    let (mut producer, mut consumer) = spectral_fifo(BLOCK);
    let block = sine_block();
    let mut out = vec![0.0; BLOCK];

    c.bench_function("fifo_push_pull_512", |b| {
        b.iter(|| {
            producer.push(black_box(&block));
            consumer.pull(black_box(&mut out));
        })
    });
}

fn benchmark_spectrum(c: &mut Criterion) {
    let mut analyzer = SpectrumAnalyzer::new(2048, FS, -48.0).unwrap();
    let block = sine_block();

    c.bench_function("spectrum_2048", |b| {
        b.iter(|| {
            analyzer.push_samples(black_box(&block));
            analyzer.compute();
        })
    });
}

criterion_group!(
    benches,
    benchmark_process_block,
    benchmark_coefficient_design,
    benchmark_fifo,
    benchmark_spectrum
);
criterion_main!(benches);
