// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Process and thread resource probes.
//!
//! - `alloc`: counting global allocator (allocated bytes, deallocations)
//! - `cpu`: process, thread and kernel CPU clocks
//! - `registry`: worker threads observed by snapshots
//! - `sampler`: snapshot, delta and the per-benchmark results map

pub mod alloc;
pub mod cpu;
mod registry;
mod sampler;

pub use alloc::CountingAllocator;
pub use registry::{WorkerGuard, WorkerRegistry};
pub use sampler::{ResourceMetric, ResourceReport, ResourceSampler, ResourceSnapshot, ResourceSummary};
