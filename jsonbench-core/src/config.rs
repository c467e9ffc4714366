// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict validation and environment overrides.
//!
//! Every key is optional. Values come from the built-in defaults, then the
//! YAML file, then `JSONBENCH_*` environment variables. Any invalid value is
//! a HardValidationError that prevents the run from starting.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{HardValidationError, JsonBenchError, JsonBenchResult};
use crate::probe::alloc::MAX_TRACKED_THREADS;
use crate::samples::SampleLoader;

pub const ENV_DATA_DIR: &str = "JSONBENCH_DATA_DIR";
pub const ENV_SAMPLE_SIZE: &str = "JSONBENCH_SAMPLE_SIZE";
pub const ENV_INIT_THREADS: &str = "JSONBENCH_INIT_THREADS";
pub const ENV_LOOPS: &str = "JSONBENCH_LOOPS";
pub const ENV_THREADS: &str = "JSONBENCH_THREADS";
pub const ENV_INCLUDE: &str = "JSONBENCH_INCLUDE";

/// Raw workload section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawWorkloadConfig {
    #[serde(default = "default_sample_size")]
    sample_size: u64,
    #[serde(default)]
    init_threads: Option<u64>,
    #[serde(default = "default_loops")]
    loops: u32,
}

fn default_sample_size() -> u64 {
    1_000_000
}

fn default_loops() -> u32 {
    20
}

impl Default for RawWorkloadConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            init_threads: None,
            loops: default_loops(),
        }
    }
}

/// Raw harness section.
#[derive(Debug, Deserialize)]
struct RawHarnessConfig {
    #[serde(default = "default_threads")]
    threads: usize,
    #[serde(default = "default_warmup_iterations")]
    warmup_iterations: u32,
    #[serde(default = "default_iteration_time_ms")]
    warmup_time_ms: u64,
    #[serde(default = "default_measurement_iterations")]
    measurement_iterations: u32,
    #[serde(default = "default_iteration_time_ms")]
    measurement_time_ms: u64,
    #[serde(default = "default_loops_per_op")]
    loops_per_op: u32,
    #[serde(default = "default_fail_on_error")]
    fail_on_error: bool,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default = "default_result_file")]
    result_file: String,
}

fn default_threads() -> usize {
    3
}

fn default_warmup_iterations() -> u32 {
    3
}

fn default_measurement_iterations() -> u32 {
    10
}

fn default_iteration_time_ms() -> u64 {
    5000
}

fn default_loops_per_op() -> u32 {
    1000
}

fn default_fail_on_error() -> bool {
    true
}

fn default_result_file() -> String {
    "results-tp.json".to_string()
}

impl Default for RawHarnessConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            warmup_iterations: default_warmup_iterations(),
            warmup_time_ms: default_iteration_time_ms(),
            measurement_iterations: default_measurement_iterations(),
            measurement_time_ms: default_iteration_time_ms(),
            loops_per_op: default_loops_per_op(),
            fail_on_error: default_fail_on_error(),
            include: Vec::new(),
            result_file: default_result_file(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    data_dir: Option<String>,
    #[serde(default)]
    workload: RawWorkloadConfig,
    #[serde(default)]
    harness: RawHarnessConfig,
}

impl From<BenchConfig> for RawConfig {
    fn from(config: BenchConfig) -> Self {
        Self {
            data_dir: Some(config.data_dir.to_string_lossy().into_owned()),
            workload: RawWorkloadConfig {
                sample_size: config.workload.sample_size,
                init_threads: Some(config.workload.init_threads),
                loops: config.workload.loops,
            },
            harness: RawHarnessConfig {
                threads: config.harness.threads,
                warmup_iterations: config.harness.warmup_iterations,
                warmup_time_ms: config.harness.warmup_time_ms,
                measurement_iterations: config.harness.measurement_iterations,
                measurement_time_ms: config.harness.measurement_time_ms,
                loops_per_op: config.harness.loops_per_op,
                fail_on_error: config.harness.fail_on_error,
                include: config.harness.include,
                result_file: config.harness.result_file.to_string_lossy().into_owned(),
            },
        }
    }
}

/// Validated workload settings.
///
/// These are reported with the run but do not change what the benchmarks do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub sample_size: u64,
    pub init_threads: u64,
    pub loops: u32,
}

/// Validated harness settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub threads: usize,
    pub warmup_iterations: u32,
    pub warmup_time_ms: u64,
    pub measurement_iterations: u32,
    pub measurement_time_ms: u64,
    pub loops_per_op: u32,
    pub fail_on_error: bool,
    /// Case-insensitive substrings; a benchmark runs if it matches any. Empty runs all.
    pub include: Vec<String>,
    pub result_file: PathBuf,
}

/// Complete validated configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub data_dir: PathBuf,
    pub workload: WorkloadConfig,
    pub harness: HarnessConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        ConfigLoader::defaults()
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Built-in defaults, no file, no environment.
    pub fn defaults() -> BenchConfig {
        Self::build(RawConfig::default())
    }

    /// Built-in defaults plus process environment overrides.
    pub fn from_env() -> JsonBenchResult<BenchConfig> {
        Self::load_string_with_env("", |key| std::env::var(key).ok())
    }

    /// Load a YAML file, then apply process environment overrides.
    pub fn load_file(path: impl AsRef<Path>) -> JsonBenchResult<BenchConfig> {
        let content = Self::read_file(path.as_ref())?;
        Self::load_string_with_env(&content, |key| std::env::var(key).ok())
    }

    /// Load and validate a YAML file without environment overrides.
    pub fn check_file(path: impl AsRef<Path>) -> JsonBenchResult<BenchConfig> {
        let content = Self::read_file(path.as_ref())?;
        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> JsonBenchResult<BenchConfig> {
        Self::load_string_with_env(content, |_| None)
    }

    /// Load a YAML string and apply overrides from `lookup`, which maps an
    /// environment variable name to its value.
    pub fn load_string_with_env<F>(content: &str, lookup: F) -> JsonBenchResult<BenchConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = Self::parse(content)?;
        Self::apply_env(&mut raw, lookup)?;
        Self::validate(raw)
    }

    /// Validate a configuration again after it was changed in code, e.g. by
    /// command-line overrides.
    pub fn revalidate(config: BenchConfig) -> JsonBenchResult<BenchConfig> {
        Self::validate(RawConfig::from(config))
    }

    fn read_file(path: &Path) -> JsonBenchResult<String> {
        if !path.exists() {
            return Err(JsonBenchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        std::fs::read_to_string(path).map_err(|e| JsonBenchError::Io {
            context: "reading config file",
            source: e,
        })
    }

    fn parse(content: &str) -> JsonBenchResult<RawConfig> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(RawConfig::default());
        }

        serde_yaml::from_str(content).map_err(|e| JsonBenchError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })
    }

    fn apply_env<F>(raw: &mut RawConfig, lookup: F) -> JsonBenchResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            raw.data_dir = Some(dir);
        }
        if let Some(value) = lookup(ENV_SAMPLE_SIZE) {
            raw.workload.sample_size = parse_env(ENV_SAMPLE_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_INIT_THREADS) {
            raw.workload.init_threads = Some(parse_env(ENV_INIT_THREADS, &value)?);
        }
        if let Some(value) = lookup(ENV_LOOPS) {
            raw.workload.loops = parse_env(ENV_LOOPS, &value)?;
        }
        if let Some(value) = lookup(ENV_THREADS) {
            raw.harness.threads = parse_env(ENV_THREADS, &value)?;
        }
        if let Some(value) = lookup(ENV_INCLUDE) {
            raw.harness.include = value.split(',').map(str::to_string).collect();
        }
        Ok(())
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> JsonBenchResult<BenchConfig> {
        if let Some(dir) = &raw.data_dir {
            if dir.trim().is_empty() {
                return Err(invalid("data_dir", dir.as_str(), "Must not be empty"));
            }
        }

        Self::validate_workload(&raw.workload)?;
        Self::validate_harness(&raw.harness)?;

        Ok(Self::build(raw))
    }

    /// Convert raw values into the typed configuration, resolving computed defaults.
    fn build(raw: RawConfig) -> BenchConfig {
        let data_dir = raw
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(SampleLoader::default_location);

        let init_threads = raw
            .workload
            .init_threads
            .unwrap_or_else(|| (raw.workload.sample_size / num_cpus::get().max(1) as u64).max(1));

        let include = raw
            .harness
            .include
            .into_iter()
            .map(|pattern| pattern.trim().to_string())
            .filter(|pattern| !pattern.is_empty())
            .collect();

        BenchConfig {
            data_dir,
            workload: WorkloadConfig {
                sample_size: raw.workload.sample_size,
                init_threads,
                loops: raw.workload.loops,
            },
            harness: HarnessConfig {
                threads: raw.harness.threads,
                warmup_iterations: raw.harness.warmup_iterations,
                warmup_time_ms: raw.harness.warmup_time_ms,
                measurement_iterations: raw.harness.measurement_iterations,
                measurement_time_ms: raw.harness.measurement_time_ms,
                loops_per_op: raw.harness.loops_per_op,
                fail_on_error: raw.harness.fail_on_error,
                include,
                result_file: PathBuf::from(raw.harness.result_file),
            },
        }
    }

    fn validate_workload(raw: &RawWorkloadConfig) -> JsonBenchResult<()> {
        if raw.sample_size == 0 {
            return Err(invalid("sample_size", "0", "Must be at least 1"));
        }

        if raw.loops == 0 {
            return Err(invalid("loops", "0", "Must be at least 1"));
        }

        if raw.init_threads == Some(0) {
            return Err(invalid("init_threads", "0", "Must be at least 1"));
        }

        Ok(())
    }

    fn validate_harness(raw: &RawHarnessConfig) -> JsonBenchResult<()> {
        if raw.threads == 0 || raw.threads > MAX_TRACKED_THREADS {
            return Err(invalid(
                "threads",
                raw.threads.to_string(),
                format!("Must be between 1 and {}", MAX_TRACKED_THREADS),
            ));
        }

        if raw.measurement_iterations == 0 {
            return Err(invalid("measurement_iterations", "0", "Must be at least 1"));
        }

        if raw.measurement_time_ms == 0 {
            return Err(invalid("measurement_time_ms", "0", "Must be greater than 0"));
        }

        // Warmup may be disabled, but an enabled warmup needs a duration
        if raw.warmup_iterations > 0 && raw.warmup_time_ms == 0 {
            return Err(invalid(
                "warmup_time_ms",
                "0",
                "Must be greater than 0 when warmup_iterations > 0",
            ));
        }

        if raw.loops_per_op == 0 {
            return Err(invalid("loops_per_op", "0", "Must be at least 1"));
        }

        for pattern in raw.include.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            if let Err(e) = RegexBuilder::new(pattern).case_insensitive(true).build() {
                return Err(invalid("include", pattern, e.to_string()));
            }
        }

        if raw.result_file.trim().is_empty() {
            return Err(invalid(
                "result_file",
                raw.result_file.as_str(),
                "Must not be empty",
            ));
        }

        Ok(())
    }
}

fn invalid(
    field: &'static str,
    value: impl Into<String>,
    reason: impl Into<String>,
) -> JsonBenchError {
    HardValidationError::InvalidFieldValue {
        field,
        value: value.into(),
        reason: reason.into(),
    }
    .into()
}

fn parse_env<T>(variable: &'static str, value: &str) -> Result<T, HardValidationError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| HardValidationError::InvalidEnvOverride {
            variable,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const VALID_CONFIG: &str = r#"
data_dir: /opt/jsonbench/data

workload:
  sample_size: 5000
  init_threads: 4
  loops: 7

harness:
  threads: 2
  warmup_iterations: 1
  warmup_time_ms: 200
  measurement_iterations: 2
  measurement_time_ms: 300
  loops_per_op: 10
  fail_on_error: false
  include:
    - Heap
    - " Read1Kb "
  result_file: out/results.json
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/opt/jsonbench/data"));
        assert_eq!(config.workload.init_threads, 4);
        assert_eq!(config.harness.threads, 2);
        assert!(!config.harness.fail_on_error);
        assert_eq!(config.harness.include, vec!["Heap", "Read1Kb"]);
        assert_eq!(config.harness.result_file, PathBuf::from("out/results.json"));
    }

    #[test]
    fn test_defaults_applied() {
        let config = ConfigLoader::load_string("").unwrap();
        assert_eq!(config, ConfigLoader::defaults());
        assert_eq!(config.data_dir, SampleLoader::default_location());
        assert_eq!(config.workload.sample_size, 1_000_000);
        assert_eq!(config.workload.loops, 20);
        assert_eq!(
            config.workload.init_threads,
            (1_000_000 / num_cpus::get() as u64).max(1)
        );
        assert_eq!(config.harness.threads, 3);
        assert_eq!(config.harness.warmup_iterations, 3);
        assert_eq!(config.harness.measurement_iterations, 10);
        assert_eq!(config.harness.measurement_time_ms, 5000);
        assert_eq!(config.harness.loops_per_op, 1000);
        assert!(config.harness.fail_on_error);
        assert!(config.harness.include.is_empty());
        assert_eq!(config.harness.result_file, PathBuf::from("results-tp.json"));
    }

    #[test]
    fn test_partial_section() {
        let yaml = r#"
harness:
  threads: 8
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.harness.threads, 8);
        assert_eq!(config.harness.loops_per_op, 1000);
    }

    #[test]
    fn test_env_overrides_file() {
        let config = ConfigLoader::load_string_with_env(
            VALID_CONFIG,
            env(&[
                (ENV_THREADS, "5"),
                (ENV_LOOPS, "3"),
                (ENV_SAMPLE_SIZE, "42"),
                (ENV_INIT_THREADS, "6"),
                (ENV_INCLUDE, "DirectBuffer, HeapString"),
                (ENV_DATA_DIR, "/tmp/samples"),
            ]),
        )
        .unwrap();

        assert_eq!(config.harness.threads, 5);
        assert_eq!(config.workload.loops, 3);
        assert_eq!(config.workload.sample_size, 42);
        assert_eq!(config.workload.init_threads, 6);
        assert_eq!(config.harness.include, vec!["DirectBuffer", "HeapString"]);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/samples"));
    }

    #[test]
    fn test_bad_env_value() {
        let result = ConfigLoader::load_string_with_env("", env(&[(ENV_THREADS, "three")]));
        assert!(matches!(
            result,
            Err(JsonBenchError::HardValidation(
                HardValidationError::InvalidEnvOverride { variable: ENV_THREADS, .. }
            ))
        ));
    }

    #[test]
    fn test_zero_threads() {
        let yaml = r#"
harness:
  threads: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_too_many_threads() {
        let result = ConfigLoader::load_string_with_env("", env(&[(ENV_THREADS, "100000")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_include_patterns_are_regexes() {
        let yaml = r#"
harness:
  include: ["Direct.*Read1Kb"]
"#;
        assert!(ConfigLoader::load_string(yaml).is_ok());

        let result = ConfigLoader::load_string_with_env("", env(&[(ENV_INCLUDE, "Heap(")]));
        assert!(matches!(
            result,
            Err(JsonBenchError::HardValidation(
                HardValidationError::InvalidFieldValue { field: "include", .. }
            ))
        ));
    }

    #[test]
    fn test_revalidate_catches_changed_values() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(ConfigLoader::revalidate(config.clone()).unwrap(), config);

        let mut too_wide = config;
        too_wide.harness.threads = MAX_TRACKED_THREADS + 1;
        assert!(matches!(
            ConfigLoader::revalidate(too_wide),
            Err(JsonBenchError::HardValidation(
                HardValidationError::InvalidFieldValue { field: "threads", .. }
            ))
        ));
    }

    #[test]
    fn test_zero_measurement_time() {
        let yaml = r#"
harness:
  measurement_time_ms: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_warmup_disabled_without_time() {
        let yaml = r#"
harness:
  warmup_iterations: 0
  warmup_time_ms: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_ok());

        let yaml = r#"
harness:
  warmup_iterations: 2
  warmup_time_ms: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_zero_init_threads() {
        let yaml = r#"
workload:
  init_threads: 0
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        let result = ConfigLoader::load_string("harness: [not, a, map");
        assert!(matches!(result, Err(JsonBenchError::ConfigParse { .. })));
    }

    #[test]
    fn test_file_not_found() {
        let result = ConfigLoader::check_file("/nonexistent/jsonbench.yaml");
        assert!(matches!(result, Err(JsonBenchError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_check_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jsonbench.yaml");
        std::fs::write(&path, VALID_CONFIG).unwrap();

        let config = ConfigLoader::check_file(&path).unwrap();
        assert_eq!(config.workload.sample_size, 5000);
    }
}
