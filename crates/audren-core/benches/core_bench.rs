//! Criterion benchmarks for audren-core primitives
//!
//! Run with: cargo bench -p audren-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use audren_core::{
    AdpcmLoopContext, BiquadFilterParameter, BiquadFilterState, SampleRateConversionQuality, adpcm, kernels,
    process_biquad_filter, resample,
};

const BLOCK_SIZES: &[usize] = &[160, 240];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48_000.0).sin() * 16_000.0)
        .collect()
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("Kernels");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut output = vec![0.0_f32; block_size];

        group.bench_with_input(BenchmarkId::new("volume_scalar", block_size), &block_size, |b, _| {
            b.iter(|| kernels::scalar::apply_volume(black_box(&mut output), black_box(&input), 0.7));
        });
        group.bench_with_input(BenchmarkId::new("volume_lanes", block_size), &block_size, |b, _| {
            b.iter(|| kernels::lanes::apply_volume(black_box(&mut output), black_box(&input), 0.7));
        });
        group.bench_with_input(BenchmarkId::new("mix_scalar", block_size), &block_size, |b, _| {
            b.iter(|| kernels::scalar::mix(black_box(&mut output), black_box(&input), 0.7));
        });
        group.bench_with_input(BenchmarkId::new("mix_lanes", block_size), &block_size, |b, _| {
            b.iter(|| kernels::lanes::mix(black_box(&mut output), black_box(&input), 0.7));
        });
    }

    group.finish();
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");
    let parameter = BiquadFilterParameter::from_coefficients([0.2, 0.4, 0.2], [-0.6, 0.2]);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        let mut output = vec![0.0_f32; block_size];

        group.bench_with_input(BenchmarkId::new("process", block_size), &block_size, |b, _| {
            let mut state = BiquadFilterState::default();
            b.iter(|| process_biquad_filter(&parameter, &mut state, black_box(&mut output), black_box(&input)));
        });
    }

    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resample");

    for quality in [
        SampleRateConversionQuality::Low,
        SampleRateConversionQuality::Default,
        SampleRateConversionQuality::High,
    ] {
        let input = generate_test_signal(240 + quality.history_len());
        let mut output = vec![0.0_f32; 240];

        group.bench_function(format!("{quality:?}"), |b| {
            b.iter(|| {
                let mut fraction = 0.0;
                resample(black_box(&mut output), black_box(&input), 0.9, &mut fraction, quality);
            });
        });
    }

    group.finish();
}

fn bench_adpcm(c: &mut Criterion) {
    let mut group = c.benchmark_group("Adpcm");
    let coefficients = [0x0400_i16, 0, 0x0800, -0x0400, 0x0600, -0x0200, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let frames = 240 / 14 + 1;
    let input: Vec<u8> = (0..frames * 8).map(|i| if i % 8 == 0 { 0x12 } else { (i * 37) as u8 }).collect();
    let mut output = vec![0_i16; frames * 14];

    group.bench_function("decode_240", |b| {
        b.iter(|| {
            let mut context = AdpcmLoopContext::default();
            black_box(adpcm::decode(&mut output, &input, 0, 240, &coefficients, &mut context));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_kernels, bench_biquad, bench_resample, bench_adpcm);

criterion_main!(benches);
