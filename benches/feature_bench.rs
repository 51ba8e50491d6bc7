//! Performance benchmarks for preprocessing and feature extraction

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eeg_gesture::features::entropy::sample_entropy;
use eeg_gesture::{FeatureExtractor, PipelineConfig, Preprocessor, Recording};

fn synthetic_channels(n_channels: usize, n_samples: usize) -> Vec<Vec<f64>> {
    (0..n_channels)
        .map(|c| {
            (0..n_samples)
                .map(|i| {
                    let t = i as f64 / 128.0;
                    (2.0 * std::f64::consts::PI * (4.0 + c as f64) * t).sin()
                        + 0.2 * ((i * 7919 + c * 104729) % 97) as f64 / 97.0
                })
                .collect()
        })
        .collect()
}

fn bench_extract_window(c: &mut Criterion) {
    let config = PipelineConfig::default();
    let extractor = FeatureExtractor::new(&config);
    let window = synthetic_channels(config.channels.len(), config.window_len());

    c.bench_function("extract_window_14ch", |b| {
        b.iter(|| {
            let _ = extractor.extract(black_box(&window));
        });
    });
}

fn bench_sample_entropy(c: &mut Criterion) {
    let channel = synthetic_channels(1, 192).remove(0);

    c.bench_function("sample_entropy_192", |b| {
        b.iter(|| sample_entropy(black_box(&channel), 2, 0.2));
    });
}

fn bench_preprocess_recording(c: &mut Criterion) {
    // 60 seconds at 128 Hz
    let config = PipelineConfig::default();
    let recording = Recording::new(
        config.channels.clone(),
        synthetic_channels(config.channels.len(), 128 * 60),
    )
    .unwrap();
    let preprocessor = Preprocessor::new(&config).unwrap();

    c.bench_function("preprocess_60s_14ch", |b| {
        b.iter(|| {
            let _ = preprocessor.process(black_box(&recording));
        });
    });
}

criterion_group!(
    benches,
    bench_extract_window,
    bench_sample_entropy,
    bench_preprocess_recording
);
criterion_main!(benches);
