// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Resource profiler: the sampler wired into the harness hooks.
//!
//! Workers enroll with the sampler's registry, a snapshot is taken before
//! each measurement iteration and the delta after it is both returned as
//! secondary metrics and recorded in the sampler's results map.

use std::sync::{Arc, Mutex};

use jsonbench_core::probe::ResourceSnapshot;
use jsonbench_core::{ProbeError, ResourceSampler, SpaceUnit, TimeUnit, WorkerGuard};

use crate::harness::{IterationProfiler, SecondaryMetric};

pub struct ResourceProfiler {
    sampler: Arc<ResourceSampler>,
    baseline: Mutex<Option<ResourceSnapshot>>,
    time_unit: TimeUnit,
    space_unit: SpaceUnit,
}

impl ResourceProfiler {
    pub fn new(sampler: Arc<ResourceSampler>) -> Self {
        Self {
            sampler,
            baseline: Mutex::new(None),
            time_unit: TimeUnit::Milliseconds,
            space_unit: SpaceUnit::Kilobytes,
        }
    }

    pub fn with_units(mut self, time_unit: TimeUnit, space_unit: SpaceUnit) -> Self {
        self.time_unit = time_unit;
        self.space_unit = space_unit;
        self
    }

    pub fn sampler(&self) -> &Arc<ResourceSampler> {
        &self.sampler
    }
}

impl IterationProfiler for ResourceProfiler {
    fn label(&self) -> &str {
        "resources"
    }

    fn register_worker(&self, benchmark: &str) -> Result<Option<WorkerGuard>, ProbeError> {
        self.sampler.registry().enroll(benchmark).map(Some)
    }

    fn before_iteration(&self, _benchmark: &str) -> Result<(), ProbeError> {
        let snapshot = self.sampler.snapshot()?;
        *self
            .baseline
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(snapshot);
        Ok(())
    }

    fn after_iteration(&self, benchmark: &str) -> Result<Vec<SecondaryMetric>, ProbeError> {
        let baseline = self
            .baseline
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let Some(baseline) = baseline else {
            tracing::warn!(benchmark = %benchmark, "No baseline snapshot for iteration");
            return Ok(Vec::new());
        };

        let report = self
            .sampler
            .delta(&baseline, self.time_unit, self.space_unit)?;
        self.sampler.record(benchmark, report);

        Ok(report
            .to_metrics()
            .iter()
            .map(|metric| SecondaryMetric {
                label: metric.label.to_string(),
                value: metric.value,
                unit: metric.unit.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_records_report() {
        let sampler = Arc::new(ResourceSampler::new());
        let profiler = ResourceProfiler::new(Arc::clone(&sampler));

        profiler.before_iteration("HeapStringWrite1Kb").unwrap();
        let _work = std::hint::black_box(vec![0u8; 4096]);
        let metrics = profiler.after_iteration("HeapStringWrite1Kb").unwrap();

        let labels: Vec<&str> = metrics.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Deallocations", "KernelCPU", "ThreadCPU", "ProcessCPU", "MemAlloc"]
        );
        assert_eq!(metrics[1].unit, "ms");
        assert_eq!(metrics[4].unit, "KB");
        assert!(sampler.latest("HeapStringWrite1Kb").is_some());
    }

    #[test]
    fn test_after_without_before_is_empty() {
        let profiler = ResourceProfiler::new(Arc::new(ResourceSampler::new()));
        assert!(profiler.after_iteration("Any").unwrap().is_empty());
    }

    #[test]
    fn test_register_worker_enrolls() {
        let sampler = Arc::new(ResourceSampler::new());
        let profiler = ResourceProfiler::new(Arc::clone(&sampler));

        let guard = profiler.register_worker("DirectBufferRead1Kb").unwrap();
        assert!(guard.is_some());
        assert_eq!(sampler.registry().len(), 1);

        drop(guard);
        assert!(sampler.registry().is_empty());
    }
}
