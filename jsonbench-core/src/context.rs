// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Owned run context.
//!
//! Everything a run shares lives here: configuration, the loaded samples,
//! the mapper and the resource sampler. Initialization is all-or-nothing,
//! and [`BenchContext::shutdown`] is the one place the resource summary is
//! produced.

use std::sync::Arc;

use crate::config::BenchConfig;
use crate::error::JsonBenchResult;
use crate::mapper::JsonMapper;
use crate::probe::{alloc, ResourceSampler, ResourceSummary};
use crate::samples::{SampleLoader, SampleSet};

/// Shared state of one benchmark run.
#[derive(Debug)]
pub struct BenchContext {
    config: BenchConfig,
    samples: SampleSet,
    mapper: JsonMapper,
    sampler: Arc<ResourceSampler>,
}

impl BenchContext {
    /// Load every sample and set up the mapper and sampler.
    ///
    /// # Errors
    /// Any sample that cannot be loaded fails the whole initialization.
    pub fn initialize(config: BenchConfig) -> JsonBenchResult<Self> {
        tracing::info!(
            data_dir = %config.data_dir.display(),
            sample_size = config.workload.sample_size,
            init_threads = config.workload.init_threads,
            loops = config.workload.loops,
            cores = num_cpus::get(),
            "Initializing benchmark context"
        );

        if !alloc::counting_active() {
            tracing::warn!("Counting allocator not installed; allocation metrics will read zero");
        }

        let samples = SampleLoader::new(&config.data_dir).load_all()?;

        tracing::info!(samples = samples.len(), "Samples loaded");

        Ok(Self {
            config,
            samples,
            mapper: JsonMapper::new(),
            sampler: Arc::new(ResourceSampler::new()),
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn mapper(&self) -> &JsonMapper {
        &self.mapper
    }

    pub fn sampler(&self) -> &Arc<ResourceSampler> {
        &self.sampler
    }

    /// Flush the sampler and release the samples.
    pub fn shutdown(self) -> ResourceSummary {
        let summary = self.sampler.flush();
        tracing::info!(benchmarks = summary.len(), "Benchmark context shut down");
        summary
    }
}
