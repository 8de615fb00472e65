//! Document build, update, commit and wire benchmarks.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use docpack_bench::{mixed_document, set_update, wide_document};
use docpack_core::{Document, DocumentConfig};

fn bench_make_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_document");

    for fields in &[10usize, 100, 1000] {
        let value = mixed_document(*fields);
        group.throughput(Throughput::Elements(*fields as u64));
        group.bench_with_input(BenchmarkId::from_parameter(fields), &value, |b, value| {
            b.iter(|| black_box(Document::make_document(black_box(value)).unwrap()));
        });
    }

    group.finish();
}

/// Update cost without compaction: dead ranges accumulate.
fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let config = DocumentConfig::new().apply_all_fields(true);
    let base = Document::make_document_with_config(&wide_document(1000), config).unwrap();

    for touched in &[1usize, 10, 100] {
        let spec = set_update(*touched, 1_000_000);
        group.throughput(Throughput::Elements(*touched as u64));
        group.bench_with_input(BenchmarkId::new("set", touched), &spec, |b, spec| {
            b.iter_batched(
                || base.clone(),
                |mut doc| black_box(doc.update(black_box(spec)).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Commit cost as a function of the number of pending dead ranges.
fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");
    let config = DocumentConfig::new().apply_all_fields(true);
    let base = Document::make_document_with_config(&wide_document(1000), config).unwrap();

    for touched in &[10usize, 100, 1000] {
        let mut dirty = base.clone();
        dirty.update(&set_update(*touched, 1_000_000)).unwrap();
        group.throughput(Throughput::Elements(*touched as u64));
        group.bench_with_input(BenchmarkId::from_parameter(touched), &dirty, |b, dirty| {
            b.iter_batched(
                || dirty.clone(),
                |mut doc| black_box(doc.commit().unwrap()),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");

    for fields in &[100usize, 1000] {
        let doc = Document::make_document(&mixed_document(*fields)).unwrap();
        let bytes = doc.serialize().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("serialize", fields), &doc, |b, doc| {
            b.iter(|| black_box(doc.serialize().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("deserialize", fields), &bytes, |b, bytes| {
            b.iter(|| black_box(Document::deserialize(black_box(bytes)).unwrap()));
        });
    }

    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let doc = Document::make_document(&wide_document(1000)).unwrap();
    c.bench_function("get_value_f999", |b| {
        b.iter(|| black_box(doc.get_value(black_box("f999")).unwrap()));
    });
    c.bench_function("to_value_1000", |b| {
        b.iter(|| black_box(doc.to_value().unwrap()));
    });
}

criterion_group!(
    benches,
    bench_make_document,
    bench_update,
    bench_commit,
    bench_wire,
    bench_read,
);

criterion_main!(benches);
