use std::io::Write;
use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::GzEncoder;
use memcload::prelude::*;

const TYPES: [&str; 4] = ["idfa", "gaid", "adid", "dvid"];

fn lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "{}\t{:016x}\t55.55\t42.42\t{},{},{},{},{}",
                TYPES[i % 4],
                i,
                i,
                i + 17,
                i * 3,
                1423,
                43
            )
        })
        .collect()
}

/// Parse only
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_line");

    for count in [1_000, 10_000] {
        let input = lines(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, input| {
            b.iter(|| {
                for line in input {
                    black_box(parse_line(line).ok());
                }
            });
        });
    }

    group.finish();
}

/// Parse, route, batch and encode: everything a file worker does before the network
fn bench_parse_route_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_route_batch");
    let shards = ShardMap::default();
    let codec = ProtobufCodec;

    for batch_size in [3, 100] {
        let input = lines(10_000);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &input, |b, input| {
            b.iter_batched(
                || BatchAccumulator::new(batch_size),
                |mut acc| {
                    let mut encoded = 0usize;
                    for line in input {
                        let Ok(record) = parse_line(line) else { continue };
                        let Ok(shard) = shards.resolve(&record.dev_type) else { continue };
                        if let Some(batch) = acc.push(shard, record) {
                            encoded += batch.records().iter().map(|r| codec.encode(r).len()).sum::<usize>();
                        }
                    }
                    for batch in acc.finish() {
                        encoded += batch.records().iter().map(|r| codec.encode(r).len()).sum::<usize>();
                    }
                    black_box(encoded)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Full dry-run file load, gzip decoding included
fn bench_dry_run_file(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.tsv.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::fast());
    for line in lines(20_000) {
        writeln!(encoder, "{line}").unwrap();
    }
    encoder.finish().unwrap();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = Arc::new(LoaderConfig {
        dry_run: true,
        ..LoaderConfig::default()
    });
    let worker = FileWorker::memcache(config);

    let mut group = c.benchmark_group("dry_run_file");
    group.throughput(Throughput::Elements(20_000));
    group.sample_size(10);
    group.bench_function("20k_lines", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(worker.run(&path).await.unwrap());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_parse_route_batch, bench_dry_run_file);
criterion_main!(benches);
