//! Benchmarks for feature extraction and classifier training
//!
//! Run with: cargo bench -p mediclean-pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mediclean_pipeline::config::ForestConfig;
use mediclean_pipeline::{BinaryClassifier, RandomForest, SupportVectorClassifier, TfidfVectorizer};
use ndarray::{Array1, Array2};

const VOCAB: &[&str] = &[
    "chest", "pain", "cough", "fever", "headache", "nausea", "dizzy", "fatigue", "rash",
    "swelling", "shortness", "breath", "history", "medication", "allergy", "patient", "report",
    "mild", "severe", "chronic",
];

fn corpus(n_docs: usize) -> Vec<String> {
    (0..n_docs)
        .map(|i| {
            (0..12)
                .map(|j| VOCAB[(i * 7 + j * 3) % VOCAB.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn dataset(n_samples: usize, n_features: usize) -> (Array2<f64>, Array1<u8>) {
    let labels: Array1<u8> = (0..n_samples).map(|i| (i % 2) as u8).collect();
    let features = Array2::from_shape_fn((n_samples, n_features), |(i, j)| {
        let signal = if i % 2 == 0 { 0.2 } else { 0.6 };
        signal + 0.01 * ((i * 13 + j * 7) % 17) as f64
    });
    (features, labels)
}

fn benchmark_tfidf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf");

    for n_docs in [100, 1000] {
        let docs = corpus(n_docs);
        group.bench_with_input(BenchmarkId::new("fit_transform", n_docs), &docs, |b, docs| {
            b.iter(|| {
                let mut vectorizer = TfidfVectorizer::new(5000).unwrap();
                vectorizer.fit_transform(black_box(docs)).unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_classifiers(c: &mut Criterion) {
    let (x, y) = dataset(200, 50);
    let mut group = c.benchmark_group("classifiers");
    group.sample_size(10);

    group.bench_function("random_forest_fit", |b| {
        b.iter(|| {
            let mut forest = RandomForest::new(ForestConfig::default());
            forest.fit(black_box(&x), black_box(&y)).unwrap();
            forest
        });
    });

    group.bench_function("svm_fit", |b| {
        b.iter(|| {
            let mut svm = SupportVectorClassifier::default();
            svm.fit(black_box(&x), black_box(&y)).unwrap();
            svm
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_tfidf, benchmark_classifiers);
criterion_main!(benches);
