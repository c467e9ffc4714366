// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness for running thread groups in timed iterations.
//!
//! A group is `threads` workers running the same operation against private
//! state. Every iteration (warmup or measurement) follows the same phases:
//!
//! 1. profilers' `before_iteration` (measurement only), on the coordinator
//! 2. start barrier: all workers released together
//! 3. workers invoke the operation until the stop flag is raised
//! 4. end barrier: every worker has published its count
//! 5. profilers' `after_iteration` (measurement only), on the coordinator
//!
//! Throughput of an iteration is the sum of per-worker throughputs, in
//! operations per millisecond.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Barrier, Mutex};
use std::time::{Duration, Instant};

use jsonbench_core::{HarnessConfig, ProbeError, WorkerGuard};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a benchmark group.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Invalid harness settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Benchmark {benchmark} failed in iteration {iteration}: {message}")]
    OperationFailed {
        benchmark: String,
        iteration: u32,
        message: String,
    },

    #[error("Profiler {profiler} failed: {source}")]
    Profiler {
        profiler: String,
        #[source]
        source: ProbeError,
    },

    #[error("Setup of {benchmark} failed: {message}")]
    Setup { benchmark: String, message: String },
}

/// One labeled value reported by a profiler for an iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryMetric {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

/// Hooks run around measurement iterations.
pub trait IterationProfiler: Send + Sync {
    /// Short name used in logs and errors.
    fn label(&self) -> &str;

    /// Called on each worker thread before its first invocation. A returned
    /// guard is held by the worker until it exits.
    fn register_worker(&self, _benchmark: &str) -> Result<Option<WorkerGuard>, ProbeError> {
        Ok(None)
    }

    /// Called on the coordinator just before the workers are released.
    fn before_iteration(&self, benchmark: &str) -> Result<(), ProbeError>;

    /// Called on the coordinator once every worker has stopped.
    fn after_iteration(&self, benchmark: &str) -> Result<Vec<SecondaryMetric>, ProbeError>;
}

/// Identity of a group run.
#[derive(Debug, Clone)]
pub struct BenchmarkParams {
    pub name: String,
    /// Logical operations performed by one invocation.
    pub ops_per_invocation: u64,
}

impl BenchmarkParams {
    pub fn new(name: impl Into<String>, ops_per_invocation: u64) -> Self {
        Self {
            name: name.into(),
            ops_per_invocation,
        }
    }
}

/// Result of one measurement iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationResult {
    /// 1-based measurement iteration number.
    pub index: u32,
    /// Throughput, operations per millisecond.
    pub score: f64,
    pub invocations: u64,
    pub errors: u64,
    pub secondary: Vec<SecondaryMetric>,
}

impl fmt::Display for IterationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} ops/ms", self.score)?;
        for metric in &self.secondary {
            write!(f, ", {}={:.2}{}", metric.label, metric.value, metric.unit)?;
        }
        Ok(())
    }
}

/// Everything measured for one group.
#[derive(Debug, Clone)]
pub struct GroupRun {
    pub name: String,
    pub threads: usize,
    pub ops_per_invocation: u64,
    pub iterations: Vec<IterationResult>,
    /// Operation errors across all iterations, warmup included.
    pub errors: u64,
}

/// Per-worker counters for the current iteration.
#[derive(Default)]
struct WorkerTally {
    invocations: AtomicU64,
    elapsed_ns: AtomicU64,
    errors: AtomicU64,
}

/// State shared between the coordinator and the workers of one group.
struct GroupControl {
    start: Barrier,
    end: Barrier,
    stop: AtomicBool,
    abort: AtomicBool,
    tallies: Vec<WorkerTally>,
    first_error: Mutex<Option<String>>,
}

impl GroupControl {
    fn new(threads: usize) -> Self {
        Self {
            start: Barrier::new(threads + 1),
            end: Barrier::new(threads + 1),
            stop: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            tallies: (0..threads).map(|_| WorkerTally::default()).collect(),
            first_error: Mutex::new(None),
        }
    }

    fn record_error(&self, message: String) {
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.get_or_insert(message);
    }

    fn take_error(&self) -> Option<String> {
        self.first_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

/// A benchmark harness for multi-threaded throughput groups.
#[derive(Debug, Clone)]
pub struct BenchmarkHarness {
    /// Number of warmup iterations before measurement
    warmup_iterations: u32,
    warmup_time: Duration,
    /// Number of measurement iterations
    measurement_iterations: u32,
    measurement_time: Duration,
    /// Worker threads per group
    threads: usize,
    /// Abort the group on the first operation error
    fail_on_error: bool,
}

impl BenchmarkHarness {
    /// Create a new benchmark harness with default settings.
    pub fn new() -> Self {
        Self {
            warmup_iterations: 3,
            warmup_time: Duration::from_secs(5),
            measurement_iterations: 10,
            measurement_time: Duration::from_secs(5),
            threads: 3,
            fail_on_error: true,
        }
    }

    /// Harness settings from validated configuration.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new()
            .warmup(config.warmup_iterations)
            .warmup_time(Duration::from_millis(config.warmup_time_ms))
            .iterations(config.measurement_iterations)
            .measurement_time(Duration::from_millis(config.measurement_time_ms))
            .threads(config.threads)
            .fail_on_error(config.fail_on_error)
    }

    /// Set the number of warmup iterations.
    pub fn warmup(mut self, iterations: u32) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    pub fn warmup_time(mut self, time: Duration) -> Self {
        self.warmup_time = time;
        self
    }

    /// Set the number of measurement iterations.
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.measurement_iterations = iterations;
        self
    }

    pub fn measurement_time(mut self, time: Duration) -> Self {
        self.measurement_time = time;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn fail_on_error(mut self, fail: bool) -> Self {
        self.fail_on_error = fail;
        self
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }

    pub fn measurement_iterations(&self) -> u32 {
        self.measurement_iterations
    }

    /// Run one group.
    ///
    /// `init` builds each worker's private state from its index; `operation`
    /// is one invocation against that state.
    pub fn run_group<S, I, O, E>(
        &self,
        params: &BenchmarkParams,
        profilers: &[&dyn IterationProfiler],
        init: I,
        operation: O,
    ) -> Result<GroupRun, HarnessError>
    where
        I: Fn(usize) -> S + Sync,
        O: Fn(&mut S) -> Result<(), E> + Sync,
        E: fmt::Display,
    {
        self.check_settings()?;

        let total_iterations = self.warmup_iterations + self.measurement_iterations;
        let control = GroupControl::new(self.threads);
        let ready = Barrier::new(self.threads + 1);
        let setup_failure: Mutex<Option<HarnessError>> = Mutex::new(None);

        tracing::info!(
            benchmark = %params.name,
            threads = self.threads,
            warmup = self.warmup_iterations,
            iterations = self.measurement_iterations,
            "Starting benchmark group"
        );

        std::thread::scope(|scope| {
            for index in 0..self.threads {
                let control = &control;
                let ready = &ready;
                let setup_failure = &setup_failure;
                let init = &init;
                let operation = &operation;

                scope.spawn(move || {
                    let mut guards: Vec<WorkerGuard> = Vec::new();
                    for profiler in profilers {
                        match profiler.register_worker(&params.name) {
                            Ok(Some(guard)) => guards.push(guard),
                            Ok(None) => {}
                            Err(source) => {
                                let mut slot = setup_failure
                                    .lock()
                                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                                slot.get_or_insert(HarnessError::Profiler {
                                    profiler: profiler.label().to_string(),
                                    source,
                                });
                            }
                        }
                    }

                    let mut state = init(index);
                    ready.wait();

                    self.worker_loop(index, total_iterations, control, &mut state, operation);
                    drop(guards);
                });
            }

            ready.wait();
            let failure = setup_failure
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .take();
            if let Some(error) = failure {
                control.abort.store(true, Ordering::SeqCst);
                control.start.wait();
                return Err(error);
            }

            self.coordinate(params, profilers, total_iterations, &control)
        })
    }

    fn check_settings(&self) -> Result<(), HarnessError> {
        if self.threads == 0 {
            return Err(HarnessError::InvalidSettings {
                reason: "threads must be at least 1".to_string(),
            });
        }
        if self.measurement_iterations == 0 {
            return Err(HarnessError::InvalidSettings {
                reason: "measurement iterations must be at least 1".to_string(),
            });
        }
        if self.measurement_time.is_zero() {
            return Err(HarnessError::InvalidSettings {
                reason: "measurement time must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    fn worker_loop<S, O, E>(
        &self,
        index: usize,
        total_iterations: u32,
        control: &GroupControl,
        state: &mut S,
        operation: &O,
    ) where
        O: Fn(&mut S) -> Result<(), E>,
        E: fmt::Display,
    {
        let tally = &control.tallies[index];

        for _ in 0..total_iterations {
            control.start.wait();
            if control.abort.load(Ordering::SeqCst) {
                return;
            }

            let started = Instant::now();
            let mut invocations = 0u64;
            let mut errors = 0u64;

            while !control.stop.load(Ordering::Relaxed) {
                match operation(state) {
                    Ok(()) => invocations += 1,
                    Err(e) => {
                        errors += 1;
                        control.record_error(e.to_string());
                        if self.fail_on_error {
                            break;
                        }
                    }
                }
            }

            tally.invocations.store(invocations, Ordering::Relaxed);
            tally
                .elapsed_ns
                .store(started.elapsed().as_nanos() as u64, Ordering::Relaxed);
            tally.errors.store(errors, Ordering::Relaxed);

            control.end.wait();
        }
    }

    fn coordinate(
        &self,
        params: &BenchmarkParams,
        profilers: &[&dyn IterationProfiler],
        total_iterations: u32,
        control: &GroupControl,
    ) -> Result<GroupRun, HarnessError> {
        let mut results = Vec::with_capacity(self.measurement_iterations as usize);
        let mut total_errors = 0u64;

        for iteration in 0..total_iterations {
            let measuring = iteration >= self.warmup_iterations;
            let duration = if measuring {
                self.measurement_time
            } else {
                self.warmup_time
            };

            if measuring {
                if let Err(error) = Self::before_iteration(profilers, &params.name) {
                    control.abort.store(true, Ordering::SeqCst);
                    control.start.wait();
                    return Err(error);
                }
            }

            control.start.wait();
            std::thread::sleep(duration);
            control.stop.store(true, Ordering::Relaxed);
            control.end.wait();
            control.stop.store(false, Ordering::Relaxed);

            let (score, invocations, errors) = self.collect(params, control);
            total_errors += errors;

            let secondary = if measuring {
                match Self::after_iteration(profilers, &params.name) {
                    Ok(metrics) => metrics,
                    Err(error) => {
                        self.abort_remaining(iteration, total_iterations, control);
                        return Err(error);
                    }
                }
            } else {
                Vec::new()
            };

            if errors > 0 {
                let message = control
                    .take_error()
                    .unwrap_or_else(|| "unknown error".to_string());
                if self.fail_on_error {
                    self.abort_remaining(iteration, total_iterations, control);
                    return Err(HarnessError::OperationFailed {
                        benchmark: params.name.clone(),
                        iteration: iteration + 1,
                        message,
                    });
                }
                tracing::warn!(
                    benchmark = %params.name,
                    errors = errors,
                    error = %message,
                    "Operation errors during iteration"
                );
            }

            if measuring {
                let result = IterationResult {
                    index: iteration - self.warmup_iterations + 1,
                    score,
                    invocations,
                    errors,
                    secondary,
                };
                tracing::info!(
                    benchmark = %params.name,
                    "Iteration {:>2}: {}",
                    result.index,
                    result
                );
                results.push(result);
            } else {
                tracing::info!(
                    benchmark = %params.name,
                    "Warmup {:>2}: {:.3} ops/ms",
                    iteration + 1,
                    score
                );
            }
        }

        Ok(GroupRun {
            name: params.name.clone(),
            threads: self.threads,
            ops_per_invocation: params.ops_per_invocation,
            iterations: results,
            errors: total_errors,
        })
    }

    /// Release workers still waiting for a next iteration so they can exit.
    fn abort_remaining(&self, iteration: u32, total_iterations: u32, control: &GroupControl) {
        if iteration + 1 < total_iterations {
            control.abort.store(true, Ordering::SeqCst);
            control.start.wait();
        }
    }

    /// Sum of per-worker throughputs, with total invocations and errors.
    fn collect(&self, params: &BenchmarkParams, control: &GroupControl) -> (f64, u64, u64) {
        let mut score = 0.0;
        let mut invocations = 0u64;
        let mut errors = 0u64;

        for tally in &control.tallies {
            let count = tally.invocations.load(Ordering::Relaxed);
            let elapsed_ns = tally.elapsed_ns.load(Ordering::Relaxed);
            if elapsed_ns > 0 {
                let elapsed_ms = elapsed_ns as f64 / 1_000_000.0;
                score += (count * params.ops_per_invocation) as f64 / elapsed_ms;
            }
            invocations += count;
            errors += tally.errors.load(Ordering::Relaxed);
        }

        (score, invocations, errors)
    }

    fn before_iteration(
        profilers: &[&dyn IterationProfiler],
        benchmark: &str,
    ) -> Result<(), HarnessError> {
        for profiler in profilers {
            profiler
                .before_iteration(benchmark)
                .map_err(|source| HarnessError::Profiler {
                    profiler: profiler.label().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn after_iteration(
        profilers: &[&dyn IterationProfiler],
        benchmark: &str,
    ) -> Result<Vec<SecondaryMetric>, HarnessError> {
        let mut metrics = Vec::new();
        for profiler in profilers {
            let reported = profiler
                .after_iteration(benchmark)
                .map_err(|source| HarnessError::Profiler {
                    profiler: profiler.label().to_string(),
                    source,
                })?;
            metrics.extend(reported);
        }
        Ok(metrics)
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn quick() -> BenchmarkHarness {
        BenchmarkHarness::new()
            .warmup(1)
            .warmup_time(Duration::from_millis(20))
            .iterations(3)
            .measurement_time(Duration::from_millis(30))
            .threads(2)
    }

    #[derive(Default)]
    struct CountingProfiler {
        registered: AtomicUsize,
        before: AtomicUsize,
        after: AtomicUsize,
    }

    impl IterationProfiler for CountingProfiler {
        fn label(&self) -> &str {
            "counting"
        }

        fn register_worker(&self, _benchmark: &str) -> Result<Option<WorkerGuard>, ProbeError> {
            self.registered.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        fn before_iteration(&self, _benchmark: &str) -> Result<(), ProbeError> {
            self.before.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn after_iteration(&self, _benchmark: &str) -> Result<Vec<SecondaryMetric>, ProbeError> {
            let n = self.after.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![SecondaryMetric {
                label: "Calls".to_string(),
                value: n as f64,
                unit: "count".to_string(),
            }])
        }
    }

    struct FailingProfiler;

    impl IterationProfiler for FailingProfiler {
        fn label(&self) -> &str {
            "failing"
        }

        fn before_iteration(&self, _benchmark: &str) -> Result<(), ProbeError> {
            Err(ProbeError::Syscall {
                syscall: "clock_gettime",
                message: "unavailable".to_string(),
            })
        }

        fn after_iteration(&self, _benchmark: &str) -> Result<Vec<SecondaryMetric>, ProbeError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_runs_requested_iterations_and_threads() {
        let profiler = CountingProfiler::default();
        let seen_workers = Mutex::new(Vec::new());

        let run = quick()
            .run_group(
                &BenchmarkParams::new("Spin", 10),
                &[&profiler],
                |index| {
                    seen_workers.lock().unwrap().push(index);
                    0u64
                },
                |counter: &mut u64| -> Result<(), String> {
                    *counter = std::hint::black_box(counter.wrapping_add(1));
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(run.threads, 2);
        assert_eq!(run.iterations.len(), 3);
        assert_eq!(run.errors, 0);
        assert_eq!(profiler.registered.load(Ordering::SeqCst), 2);
        assert_eq!(profiler.before.load(Ordering::SeqCst), 3);
        assert_eq!(profiler.after.load(Ordering::SeqCst), 3);

        let mut workers = seen_workers.into_inner().unwrap();
        workers.sort();
        assert_eq!(workers, vec![0, 1]);

        for (i, iteration) in run.iterations.iter().enumerate() {
            assert_eq!(iteration.index, i as u32 + 1);
            assert!(iteration.invocations > 0);
            assert!(iteration.score > 0.0);
            assert_eq!(iteration.secondary[0].value, (i + 1) as f64);
        }
    }

    #[test]
    fn test_fail_on_error_aborts() {
        let result = quick().run_group(
            &BenchmarkParams::new("Broken", 1),
            &[],
            |_| (),
            |_: &mut ()| Err("Incoming data was empty"),
        );

        match result {
            Err(HarnessError::OperationFailed {
                benchmark,
                iteration,
                message,
            }) => {
                assert_eq!(benchmark, "Broken");
                assert_eq!(iteration, 1);
                assert!(message.contains("empty"));
            }
            other => panic!("expected OperationFailed, got {:?}", other.map(|r| r.name)),
        }
    }

    #[test]
    fn test_errors_counted_when_not_failing() {
        let calls = AtomicU64::new(0);
        let run = quick()
            .fail_on_error(false)
            .run_group(
                &BenchmarkParams::new("Flaky", 1),
                &[],
                |_| (),
                |_: &mut ()| {
                    if calls.fetch_add(1, Ordering::Relaxed) % 2 == 0 {
                        Err("odd call")
                    } else {
                        Ok(())
                    }
                },
            )
            .unwrap();

        assert!(run.errors > 0);
        assert_eq!(run.iterations.len(), 3);
    }

    #[test]
    fn test_profiler_failure_aborts() {
        let result = quick().run_group(
            &BenchmarkParams::new("Probe", 1),
            &[&FailingProfiler],
            |_| (),
            |_: &mut ()| Ok::<(), String>(()),
        );
        assert!(matches!(result, Err(HarnessError::Profiler { .. })));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = quick().threads(0).run_group(
            &BenchmarkParams::new("None", 1),
            &[],
            |_| (),
            |_: &mut ()| Ok::<(), String>(()),
        );
        assert!(matches!(result, Err(HarnessError::InvalidSettings { .. })));
    }

    #[test]
    fn test_from_config() {
        let config = jsonbench_core::ConfigLoader::defaults().harness;
        let harness = BenchmarkHarness::from_config(&config);
        assert_eq!(harness.thread_count(), 3);
        assert_eq!(harness.measurement_iterations(), 10);
    }
}
