// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Resource sampler: snapshots, deltas and the per-benchmark results map.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::registry::WorkerRegistry;
use super::{alloc, cpu};
use crate::error::ProbeError;
use crate::types::{SpaceUnit, TimeUnit};

/// Raw counters captured together at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Blocks returned to the allocator.
    pub deallocations: u64,
    /// Kernel time of the process, ns.
    pub kernel_time_ns: u64,
    /// CPU time of the observed threads, ns.
    pub thread_cpu_ns: u64,
    /// CPU time of the whole process, ns.
    pub process_cpu_ns: u64,
    /// Bytes allocated by the observed threads.
    pub allocated_bytes: u64,
}

/// One labeled value of a [`ResourceReport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceMetric {
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

/// Difference between two snapshots in display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub deallocations: u64,
    pub kernel_time: u64,
    pub thread_cpu: u64,
    pub process_cpu: u64,
    pub allocated: f64,
    pub time_unit: TimeUnit,
    pub space_unit: SpaceUnit,
}

impl ResourceReport {
    pub const DEALLOCATIONS: &'static str = "Deallocations";
    pub const KERNEL_CPU: &'static str = "KernelCPU";
    pub const THREAD_CPU: &'static str = "ThreadCPU";
    pub const PROCESS_CPU: &'static str = "ProcessCPU";
    pub const MEM_ALLOC: &'static str = "MemAlloc";

    /// The five counters as labeled metrics.
    pub fn to_metrics(&self) -> [ResourceMetric; 5] {
        let time = self.time_unit.symbol();
        [
            ResourceMetric {
                label: Self::DEALLOCATIONS,
                value: self.deallocations as f64,
                unit: "count",
            },
            ResourceMetric {
                label: Self::KERNEL_CPU,
                value: self.kernel_time as f64,
                unit: time,
            },
            ResourceMetric {
                label: Self::THREAD_CPU,
                value: self.thread_cpu as f64,
                unit: time,
            },
            ResourceMetric {
                label: Self::PROCESS_CPU,
                value: self.process_cpu as f64,
                unit: time,
            },
            ResourceMetric {
                label: Self::MEM_ALLOC,
                value: self.allocated,
                unit: self.space_unit.symbol(),
            },
        ]
    }
}

impl fmt::Display for ResourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = self.time_unit.symbol();
        write!(
            f,
            "deallocations={} kernel={}{} thread={}{} process={}{} alloc={:.2}{}",
            self.deallocations,
            self.kernel_time,
            time,
            self.thread_cpu,
            time,
            self.process_cpu,
            time,
            self.allocated,
            self.space_unit.symbol()
        )
    }
}

/// Snapshot source plus the concurrent results map.
#[derive(Debug, Default)]
pub struct ResourceSampler {
    registry: Arc<WorkerRegistry>,
    results: DashMap<String, ResourceReport>,
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workers enrolled here are the threads a snapshot observes.
    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Capture all five counters.
    ///
    /// Thread fields sum over enrolled workers. With nobody enrolled they
    /// fall back to the calling thread's CPU time and the process-wide
    /// allocation total.
    pub fn snapshot(&self) -> Result<ResourceSnapshot, ProbeError> {
        let (thread_cpu_ns, allocated_bytes) = match self.registry.thread_cpu_time()? {
            Some(workers_cpu) => (
                workers_cpu,
                self.registry
                    .allocated_bytes()
                    .unwrap_or_else(alloc::allocated_bytes),
            ),
            None => (cpu::current_thread_cpu_time()?, alloc::allocated_bytes()),
        };

        Ok(ResourceSnapshot {
            deallocations: alloc::deallocations(),
            kernel_time_ns: cpu::kernel_time()?,
            thread_cpu_ns,
            process_cpu_ns: cpu::process_cpu_time()?,
            allocated_bytes,
        })
    }

    /// Take a snapshot and subtract `baseline` from it.
    ///
    /// Each field saturates at zero, which covers a worker set that shrank
    /// between the two snapshots.
    pub fn delta(
        &self,
        baseline: &ResourceSnapshot,
        time_unit: TimeUnit,
        space_unit: SpaceUnit,
    ) -> Result<ResourceReport, ProbeError> {
        let now = self.snapshot()?;
        Ok(ResourceReport {
            deallocations: now.deallocations.saturating_sub(baseline.deallocations),
            kernel_time: time_unit
                .from_nanos(now.kernel_time_ns.saturating_sub(baseline.kernel_time_ns)),
            thread_cpu: time_unit.from_nanos(now.thread_cpu_ns.saturating_sub(baseline.thread_cpu_ns)),
            process_cpu: time_unit
                .from_nanos(now.process_cpu_ns.saturating_sub(baseline.process_cpu_ns)),
            allocated: space_unit
                .from_bytes(now.allocated_bytes.saturating_sub(baseline.allocated_bytes)),
            time_unit,
            space_unit,
        })
    }

    /// Store the latest report for `benchmark`, replacing any earlier one.
    pub fn record(&self, benchmark: &str, report: ResourceReport) {
        self.results.insert(benchmark.to_string(), report);
    }

    /// Latest report stored for `benchmark`.
    pub fn latest(&self, benchmark: &str) -> Option<ResourceReport> {
        self.results.get(benchmark).map(|entry| *entry)
    }

    /// Number of benchmarks with a stored report.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Drain every stored report into a summary sorted by benchmark name.
    pub fn flush(&self) -> ResourceSummary {
        let names: Vec<String> = self.results.iter().map(|entry| entry.key().clone()).collect();
        let mut rows: Vec<(String, ResourceReport)> = names
            .into_iter()
            .filter_map(|name| self.results.remove(&name))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        let summary = ResourceSummary { rows };
        if summary.is_empty() {
            tracing::info!("Resource summary: no benchmark recorded resource usage");
        } else {
            tracing::info!(benchmarks = summary.len(), "Resource summary\n{}", summary);
        }
        summary
    }
}

/// Per-benchmark resource reports collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceSummary {
    rows: Vec<(String, ResourceReport)>,
}

impl ResourceSummary {
    pub fn rows(&self) -> &[(String, ResourceReport)] {
        &self.rows
    }

    pub fn get(&self, benchmark: &str) -> Option<&ResourceReport> {
        self.rows
            .iter()
            .find(|(name, _)| name == benchmark)
            .map(|(_, report)| report)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ResourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔════════════════════════════╦═══════════╦════════════╦════════════╦════════════╦══════════════╗")?;
        writeln!(f, "║ Benchmark                  ║ Deallocs  ║ KernelCPU  ║ ThreadCPU  ║ ProcessCPU ║ MemAlloc     ║")?;
        writeln!(f, "╠════════════════════════════╬═══════════╬════════════╬════════════╬════════════╬══════════════╣")?;

        for (name, report) in &self.rows {
            let time = report.time_unit.symbol();
            writeln!(
                f,
                "║ {:<26} ║ {:>9} ║ {:>10} ║ {:>10} ║ {:>10} ║ {:>12} ║",
                name,
                report.deallocations,
                format!("{}{}", report.kernel_time, time),
                format!("{}{}", report.thread_cpu, time),
                format!("{}{}", report.process_cpu, time),
                format!("{:.2}{}", report.allocated, report.space_unit.symbol()),
            )?;
        }

        write!(f, "╚════════════════════════════╩═══════════╩════════════╩════════════╩════════════╩══════════════╝")
    }
}
