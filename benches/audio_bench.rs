//! Benchmarks for per-frame audio analysis.

use std::f32::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sonosphere::audio::{
    AudioFeatureExtractor, ByteAnalyser, Track, WindowAnalyser, DEFAULT_FFT_SIZE,
};

const SAMPLE_RATE: u32 = 44100;

fn generate_sine(freq: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

fn bench_byte_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("Byte Spectrum");

    for fft_size in [512, 1024, 2048, 4096] {
        let samples = generate_sine(1000.0, fft_size);

        group.throughput(Throughput::Elements(fft_size as u64));
        group.bench_with_input(BenchmarkId::new("frequency_bytes", fft_size), &fft_size, |b, &size| {
            let mut analyser = ByteAnalyser::new(size);
            let mut out = vec![0u8; analyser.bin_count()];
            b.iter(|| {
                analyser.frequency_bytes(black_box(&samples), &mut out);
                black_box(&out);
            });
        });
    }

    group.finish();
}

fn bench_feature_extraction(c: &mut Criterion) {
    let track = Track::new(generate_sine(440.0, SAMPLE_RATE as usize), SAMPLE_RATE);
    track.set_playing(true);
    track.advance(DEFAULT_FFT_SIZE * 4);

    let mut analyser = WindowAnalyser::new(track, DEFAULT_FFT_SIZE);
    let mut extractor = AudioFeatureExtractor::new(DEFAULT_FFT_SIZE / 2);

    c.bench_function("extract_features", |b| {
        b.iter(|| black_box(extractor.extract(Some(&mut analyser))));
    });
}

criterion_group!(benches, bench_byte_spectrum, bench_feature_extraction);
criterion_main!(benches);
