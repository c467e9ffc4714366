// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Serialization microbenchmarks.
//!
//! Encodes the decoded records of every sample to a string and to a direct
//! or heap output buffer.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsonbench_benchmark::BenchmarkSpec;
use jsonbench_core::{BenchContext, BenchConfig, CountingAllocator, Fixture, Operation, SampleSize};

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

fn bench_serialize(c: &mut Criterion) {
    let ctx = BenchContext::initialize(BenchConfig::default()).expect("Failed to load samples");

    for size in SampleSize::ALL {
        let mut group = c.benchmark_group(format!("serialize_{}", size));
        group.measurement_time(Duration::from_secs(5));

        for spec in BenchmarkSpec::all()
            .into_iter()
            .filter(|s| s.size == size && s.operation == Operation::Write)
        {
            let fixture = Fixture::setup(&ctx, spec.fixture_spec()).expect("Failed to set up fixture");
            group.throughput(Throughput::Bytes(fixture.payload_len() as u64));

            group.bench_function(BenchmarkId::from_parameter(spec.name()), |b| {
                let mut view = fixture.buffer_view();
                b.iter(|| {
                    spec.invoke(ctx.mapper(), fixture.records(), &mut view, 1)
                        .expect("Serialization failed")
                });
            });

            fixture.teardown();
        }

        group.finish();
    }
}

criterion_group!(benches, bench_serialize);
criterion_main!(benches);
