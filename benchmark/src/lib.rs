// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! jsonbench Benchmarking Framework
//!
//! Runs the JSON mapping benchmark matrix in multi-threaded groups and
//! reports throughput alongside per-iteration resource usage.
//!
//! # Benchmark Matrix
//!
//! - **Buffer type**: direct (mmap) vs heap backing storage
//! - **Parse source**: UTF-8 string vs buffer cursor
//! - **Operation**: deserialize (read) vs serialize (write)
//! - **Size**: 1Kb, 56Kb, 118Kb and 614Kb sample payloads
//!
//! # Data Output
//!
//! Results are written as JSON with primary scores in ops/ms and the
//! resource profiler's metrics as secondary scores.

pub mod harness;
pub mod metrics;
pub mod options;
pub mod profiler;
pub mod reporter;
pub mod suite;

pub use harness::{
    BenchmarkHarness, BenchmarkParams, GroupRun, HarnessError, IterationProfiler,
    IterationResult, SecondaryMetric,
};
pub use metrics::{BenchmarkReport, BenchmarkResult, ScoreMetrics, SecondaryScore, SystemInfo};
pub use options::RunOverrides;
pub use profiler::ResourceProfiler;
pub use reporter::{render_table, JsonReporter, ReporterError};
pub use suite::{BenchmarkSpec, IncludeFilter, SuiteRunner};

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: jsonbench_core::CountingAllocator = jsonbench_core::CountingAllocator;
