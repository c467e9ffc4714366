// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Standardized metrics types for benchmark results.
//!
//! A result carries the primary throughput score over all measurement
//! iterations plus the averaged secondary metrics the profilers reported.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use jsonbench_core::{HarnessConfig, WorkloadConfig};
use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::harness::GroupRun;

/// Unit of every primary score.
pub const SCORE_UNIT: &str = "ops/ms";

/// Throughput statistics over the measurement iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1)
    pub std_dev: f64,
    pub unit: String,
    /// Per-iteration scores in iteration order
    pub samples: Vec<f64>,
}

impl ScoreMetrics {
    /// Calculate statistics from per-iteration scores.
    pub fn from_samples(samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
                std_dev: 0.0,
                unit: SCORE_UNIT.to_string(),
                samples,
            };
        }

        let len = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / len;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let std_dev = if samples.len() > 1 {
            let variance = samples
                .iter()
                .map(|&x| {
                    let diff = x - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (len - 1.0);
            variance.sqrt()
        } else {
            0.0
        };

        Self {
            mean,
            min,
            max,
            std_dev,
            unit: SCORE_UNIT.to_string(),
            samples,
        }
    }
}

/// A profiler metric averaged over the measurement iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryScore {
    pub label: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    /// Logical CPUs
    pub cpu_cores: usize,
    pub physical_cores: Option<usize>,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    pub hostname: String,
    /// Whether allocation counters were live for this run
    pub allocation_tracking: bool,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            physical_cores: sys.physical_core_count(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            allocation_tracking: jsonbench_core::probe::alloc::counting_active(),
        }
    }
}

/// A single benchmark result with all associated metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark
    pub name: String,
    /// Parameters derived from the name
    pub params: BTreeMap<String, String>,
    pub threads: usize,
    pub ops_per_invocation: u64,
    pub score: ScoreMetrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<SecondaryScore>,
    /// Operation errors, warmup included
    pub errors: u64,
    /// Additional metadata specific to this benchmark
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Aggregate a group run.
    pub fn from_run(run: GroupRun, params: BTreeMap<String, String>) -> Self {
        let scores: Vec<f64> = run.iterations.iter().map(|it| it.score).collect();

        // Labels in first-seen order; values per label across iterations
        let mut order: Vec<(String, String)> = Vec::new();
        let mut values: HashMap<String, Vec<f64>> = HashMap::new();
        for iteration in &run.iterations {
            for metric in &iteration.secondary {
                if !values.contains_key(&metric.label) {
                    order.push((metric.label.clone(), metric.unit.clone()));
                }
                values
                    .entry(metric.label.clone())
                    .or_default()
                    .push(metric.value);
            }
        }

        let secondary = order
            .into_iter()
            .filter_map(|(label, unit)| {
                let samples = values.remove(&label)?;
                let stats = ScoreMetrics::from_samples(samples);
                Some(SecondaryScore {
                    label,
                    mean: stats.mean,
                    min: stats.min,
                    max: stats.max,
                    unit,
                })
            })
            .collect();

        Self {
            name: run.name,
            params,
            threads: run.threads,
            ops_per_invocation: run.ops_per_invocation,
            score: ScoreMetrics::from_samples(scores),
            secondary,
            errors: run.errors,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the result.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn secondary(&self, label: &str) -> Option<&SecondaryScore> {
        self.secondary.iter().find(|s| s.label == label)
    }
}

/// Complete benchmark suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Timestamp when benchmarks were run
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    /// Harness settings in effect
    pub harness: Option<HarnessConfig>,
    pub workload: Option<WorkloadConfig>,
    /// Individual benchmark results
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    /// Create a new benchmark report.
    pub fn new() -> Self {
        Self {
            benchmark_suite: "jsonbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            harness: None,
            workload: None,
            results: Vec::new(),
        }
    }

    /// Record the settings the run used.
    pub fn with_settings(mut self, harness: &HarnessConfig, workload: &WorkloadConfig) -> Self {
        self.harness = Some(harness.clone());
        self.workload = Some(workload.clone());
        self
    }

    /// Add a result to the report.
    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    pub fn result(&self, name: &str) -> Option<&BenchmarkResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}
