// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Per-benchmark fixtures.

use crate::buffer::SampleBuffer;
use crate::context::BenchContext;
use crate::error::{JsonBenchResult, SampleLoadError};
use crate::model::Person;
use crate::types::{BufferKind, SampleSize};

/// Which sample and which buffer representation a benchmark uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixtureSpec {
    pub size: SampleSize,
    pub kind: BufferKind,
}

impl FixtureSpec {
    pub fn new(size: SampleSize, kind: BufferKind) -> Self {
        Self { size, kind }
    }
}

/// Shared, read-only state for one benchmark: the sample buffer and the
/// records decoded from it.
#[derive(Debug)]
pub struct Fixture {
    spec: FixtureSpec,
    buffer: SampleBuffer,
    records: Vec<Person>,
}

impl Fixture {
    /// Resolve the sample buffer and decode its records once, so write
    /// benchmarks measure serialization only.
    pub fn setup(ctx: &BenchContext, spec: FixtureSpec) -> JsonBenchResult<Self> {
        let buffer = ctx
            .samples()
            .buffer(spec.kind, spec.size)
            .ok_or_else(|| SampleLoadError::UnknownSample {
                name: spec.size.file_name().to_string(),
            })?
            .duplicate();

        let mut reader = buffer.duplicate();
        let records: Vec<Person> = ctx.mapper().read_buffer(&mut reader)?;

        tracing::debug!(
            sample = %spec.size,
            kind = %spec.kind,
            records = records.len(),
            "Fixture ready"
        );

        Ok(Self {
            spec,
            buffer,
            records,
        })
    }

    pub fn spec(&self) -> FixtureSpec {
        self.spec
    }

    /// A private cursor over the sample bytes.
    pub fn buffer_view(&self) -> SampleBuffer {
        self.buffer.duplicate()
    }

    pub fn records(&self) -> &[Person] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Payload length in bytes.
    pub fn payload_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn teardown(self) {
        tracing::debug!(sample = %self.spec.size, kind = %self.spec.kind, "Fixture released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    #[test]
    fn test_setup_decodes_records() {
        let ctx = BenchContext::initialize(ConfigLoader::defaults()).unwrap();

        for kind in BufferKind::ALL {
            let fixture = Fixture::setup(&ctx, FixtureSpec::new(SampleSize::Kb56, kind)).unwrap();
            assert_eq!(fixture.spec().kind, kind);
            assert_eq!(fixture.record_count(), 82);
            assert_eq!(fixture.buffer_view().kind(), kind);
            assert_eq!(fixture.buffer_view().reader_index(), 0);
            fixture.teardown();
        }
    }

    #[test]
    fn test_views_are_independent() {
        let ctx = BenchContext::initialize(ConfigLoader::defaults()).unwrap();
        let fixture = Fixture::setup(&ctx, FixtureSpec::new(SampleSize::Kb1, BufferKind::Heap)).unwrap();

        let mut first = fixture.buffer_view();
        first.skip_bytes(10);
        let second = fixture.buffer_view();

        assert_eq!(second.reader_index(), 0);
        assert_eq!(second.readable_bytes(), fixture.payload_len());
    }
}
