// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Command-line overrides shared by the runner binaries.

use std::path::PathBuf;

use jsonbench_core::{BenchConfig, ConfigLoader, JsonBenchResult};

/// Harness settings used by `--quick`.
pub const QUICK_WARMUP_ITERATIONS: u32 = 1;
pub const QUICK_WARMUP_TIME_MS: u64 = 200;
pub const QUICK_MEASUREMENT_ITERATIONS: u32 = 3;
pub const QUICK_MEASUREMENT_TIME_MS: u64 = 500;
pub const QUICK_LOOPS_PER_OP: u32 = 10;

/// Run settings given on the command line. Unset fields keep the
/// configured value.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub include: Vec<String>,
    pub threads: Option<usize>,
    pub iterations: Option<u32>,
    pub quick: bool,
    pub output: Option<PathBuf>,
}

impl RunOverrides {
    /// Apply the overrides and validate the result like a loaded config.
    ///
    /// `--quick` is applied first, so an explicit iteration count wins.
    pub fn apply(&self, mut config: BenchConfig) -> JsonBenchResult<BenchConfig> {
        let harness = &mut config.harness;

        if self.quick {
            harness.warmup_iterations = QUICK_WARMUP_ITERATIONS;
            harness.warmup_time_ms = QUICK_WARMUP_TIME_MS;
            harness.measurement_iterations = QUICK_MEASUREMENT_ITERATIONS;
            harness.measurement_time_ms = QUICK_MEASUREMENT_TIME_MS;
            harness.loops_per_op = QUICK_LOOPS_PER_OP;
        }
        if !self.include.is_empty() {
            harness.include = self.include.clone();
        }
        if let Some(threads) = self.threads {
            harness.threads = threads;
        }
        if let Some(iterations) = self.iterations {
            harness.measurement_iterations = iterations;
        }
        if let Some(output) = &self.output {
            harness.result_file = output.clone();
        }

        ConfigLoader::revalidate(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonbench_core::{HardValidationError, JsonBenchError};

    #[test]
    fn test_no_overrides_keeps_config() {
        let config = ConfigLoader::defaults();
        assert_eq!(RunOverrides::default().apply(config.clone()).unwrap(), config);
    }

    #[test]
    fn test_quick_then_explicit_iterations() {
        let overrides = RunOverrides {
            quick: true,
            iterations: Some(7),
            include: vec!["Heap".to_string()],
            output: Some(PathBuf::from("out/quick.json")),
            ..RunOverrides::default()
        };
        let config = overrides.apply(ConfigLoader::defaults()).unwrap();

        assert_eq!(config.harness.warmup_iterations, QUICK_WARMUP_ITERATIONS);
        assert_eq!(config.harness.measurement_time_ms, QUICK_MEASUREMENT_TIME_MS);
        assert_eq!(config.harness.loops_per_op, QUICK_LOOPS_PER_OP);
        assert_eq!(config.harness.measurement_iterations, 7);
        assert_eq!(config.harness.include, vec!["Heap"]);
        assert_eq!(config.harness.result_file, PathBuf::from("out/quick.json"));
    }

    #[test]
    fn test_thread_override_is_validated() {
        let overrides = RunOverrides {
            threads: Some(200),
            ..RunOverrides::default()
        };
        assert!(matches!(
            overrides.apply(ConfigLoader::defaults()),
            Err(JsonBenchError::HardValidation(
                HardValidationError::InvalidFieldValue { field: "threads", .. }
            ))
        ));

        let zero_iterations = RunOverrides {
            iterations: Some(0),
            ..RunOverrides::default()
        };
        assert!(zero_iterations.apply(ConfigLoader::defaults()).is_err());
    }

    #[test]
    fn test_bad_include_regex_is_rejected() {
        let overrides = RunOverrides {
            include: vec!["Direct[".to_string()],
            ..RunOverrides::default()
        };
        assert!(overrides.apply(ConfigLoader::defaults()).is_err());
    }
}
