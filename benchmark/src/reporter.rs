// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON report generation for benchmark results.
//!
//! Writes the report either to an explicit result file or to a timestamped
//! file in an output directory, and renders the score table printed after a run.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::metrics::BenchmarkReport;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to write report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON reporter for benchmark results.
pub struct JsonReporter {
    /// Output directory for benchmark data
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save a report under a timestamped name in the output directory.
    ///
    /// Returns the path to the created file.
    pub fn save(&self, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
        let filepath = self
            .output_dir
            .join(format!("{}_{}.json", report.benchmark_suite, timestamp));
        Self::write_to(report, &filepath)?;
        Ok(filepath)
    }

    /// Write a report to an exact path, creating parent directories.
    pub fn write_to(report: &BenchmarkReport, path: impl AsRef<Path>) -> Result<(), ReporterError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report)?;

        tracing::info!(path = %path.display(), results = report.results.len(), "Report written");
        Ok(())
    }

    /// List all existing benchmark files in the output directory.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load an existing benchmark report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReporterError> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(file)?;
        Ok(report)
    }
}

/// Score table: one row per benchmark with its throughput and allocation.
pub fn render_table(report: &BenchmarkReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "╔══════════════════════════╦═════════╦══════════════╦════════════╦══════════════╗");
    let _ = writeln!(out, "║ Benchmark                ║ Threads ║ Score        ║ Error      ║ MemAlloc     ║");
    let _ = writeln!(out, "╠══════════════════════════╬═════════╬══════════════╬════════════╬══════════════╣");

    for result in &report.results {
        let alloc = result
            .secondary("MemAlloc")
            .map(|m| format!("{:.1}{}", m.mean, m.unit))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "║ {:<24} ║ {:>7} ║ {:>12.3} ║ {:>10} ║ {:>12} ║",
            result.name,
            result.threads,
            result.score.mean,
            format!("±{:.3}", result.score.std_dev),
            alloc
        );
    }

    let _ = writeln!(out, "╚══════════════════════════╩═════════╩══════════════╩════════════╩══════════════╝");
    let _ = write!(out, "Scores in {}", crate::metrics::SCORE_UNIT);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{GroupRun, IterationResult};
    use crate::metrics::BenchmarkResult;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn report() -> BenchmarkReport {
        let mut report = BenchmarkReport::new();
        report.add_result(BenchmarkResult::from_run(
            GroupRun {
                name: "HeapStringRead1Kb".to_string(),
                threads: 3,
                ops_per_invocation: 1000,
                iterations: vec![IterationResult {
                    index: 1,
                    score: 42.0,
                    invocations: 5,
                    errors: 0,
                    secondary: Vec::new(),
                }],
                errors: 0,
            },
            BTreeMap::new(),
        ));
        report
    }

    #[test]
    fn test_reporter_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let path = reporter.save(&report()).unwrap();
        assert!(path.exists());
        assert_eq!(reporter.list_reports().unwrap(), vec![path.clone()]);

        let loaded = JsonReporter::load(&path).unwrap();
        assert_eq!(loaded.results.len(), 1);
        assert_eq!(loaded.results[0].name, "HeapStringRead1Kb");
        assert_eq!(loaded.results[0].score.mean, 42.0);
    }

    #[test]
    fn test_write_to_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("results-tp.json");

        JsonReporter::write_to(&report(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&report());
        assert!(table.contains("HeapStringRead1Kb"));
        assert!(table.contains("42.000"));
        assert!(table.ends_with("Scores in ops/ms"));
    }
}
