//! jsonbench Core Library
//!
//! Building blocks for the JSON serialization benchmark suite: sample
//! loading, buffer representations, the record model, the JSON round-trip
//! driver, process resource probes, configuration and the owned run context.

pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod fixture;
pub mod mapper;
pub mod model;
pub mod probe;
pub mod samples;
pub mod types;

// Re-export commonly used types
pub use buffer::{BufferWriter, SampleBuffer};
pub use config::{BenchConfig, ConfigLoader, HarnessConfig, WorkloadConfig};
pub use context::BenchContext;
pub use error::{
    BufferError, CodecError, HardValidationError, JsonBenchError, JsonBenchResult, ProbeError,
    SampleLoadError,
};
pub use fixture::{Fixture, FixtureSpec};
pub use mapper::JsonMapper;
pub use model::{Friend, Person};
pub use probe::{
    CountingAllocator, ResourceReport, ResourceSampler, ResourceSnapshot, ResourceSummary,
    WorkerGuard, WorkerRegistry,
};
pub use samples::{Sample, SampleLoader, SampleSet};
pub use types::{BufferKind, Operation, ParseSource, SampleSize, SpaceUnit, TimeUnit};

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: CountingAllocator = CountingAllocator;
