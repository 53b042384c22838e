//! Benchmarks for docrecon reconstruction performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic tokens and in-memory pages, so no
//! external tools are needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use docrecon::geometry::BBox;
use docrecon::model::{Line, PageContent, PrimitiveBlock, RawSpan, RecognitionToken};
use docrecon::reconstruct::{
    BlockClassifier, ReconstructOptions, ReconstructionPipeline, TokenAggregator,
};
use docrecon::render::escape_latex;
use docrecon::source::MemorySource;

/// Creates a page worth of tokens spread over `blocks` blocks.
fn create_tokens(blocks: u32, per_block: u32) -> Vec<RecognitionToken> {
    let mut tokens = Vec::new();
    for block in 0..blocks {
        for i in 0..per_block {
            let confidence = ((block * 37 + i * 11) % 100) as i32;
            let bbox = BBox::from_xywh(i * 40, block * 30, 35, 20);
            tokens.push(RecognitionToken::new(format!("w{}", i), confidence, bbox, block));
        }
    }
    tokens
}

/// Creates a structured source with the given number of pages.
fn create_source(page_count: usize) -> MemorySource {
    let mut source = MemorySource::new("bench");
    for i in 0..page_count {
        let lines = (0..40)
            .map(|l| {
                Line::new(vec![
                    RawSpan::new(format!("Page {} line {} ", i + 1, l), 11.0, "Times-Roman"),
                    RawSpan::new("with emphasis", 11.0, "Times-Bold"),
                ])
            })
            .collect();
        source.push(PageContent::Primitives(vec![PrimitiveBlock::text(lines)]));
    }
    source
}

/// Benchmark token aggregation and classification.
fn bench_aggregate_classify(c: &mut Criterion) {
    let tokens = create_tokens(50, 20);
    let aggregator = TokenAggregator::new(5);
    let classifier = BlockClassifier::new(50);

    c.bench_function("aggregate_1000_tokens", |b| {
        b.iter(|| aggregator.aggregate(black_box(&tokens)));
    });

    c.bench_function("aggregate_and_classify", |b| {
        b.iter(|| classifier.classify_all(aggregator.aggregate(black_box(&tokens))));
    });
}

/// Benchmark LaTeX escaping.
fn bench_escape_latex(c: &mut Criterion) {
    let text = "Revenue grew 12% to $4.5M (Q3 #1) & costs fell; see x_1^2 ~ {y}\\z\n".repeat(50);

    c.bench_function("escape_latex", |b| {
        b.iter(|| escape_latex(black_box(&text)));
    });
}

/// Benchmark structured reconstruction at various sizes.
fn bench_structured_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("structured_pipeline");

    for page_count in [1, 10, 50].iter() {
        let source = create_source(*page_count);

        group.bench_function(format!("{}_pages_parallel", page_count), |b| {
            let pipeline = ReconstructionPipeline::new(ReconstructOptions::default());
            b.iter(|| pipeline.run(black_box(&source)).unwrap());
        });

        group.bench_function(format!("{}_pages_sequential", page_count), |b| {
            let pipeline = ReconstructionPipeline::new(ReconstructOptions::new().sequential());
            b.iter(|| pipeline.run(black_box(&source)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_aggregate_classify,
    bench_escape_latex,
    bench_structured_pipeline,
);
criterion_main!(benches);
