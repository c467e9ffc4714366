// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The JSON mapping benchmark matrix and its runner.
//!
//! Every benchmark is one point of {Direct, Heap} x {String, Buffer} x
//! {Read, Write} x {1Kb, 56Kb, 118Kb, 614Kb}. The name encodes all four
//! axes, e.g. `DirectStringRead118Kb`.

use std::collections::BTreeMap;
use std::fmt;
use std::hint::black_box;

use regex::{Regex, RegexBuilder};

use jsonbench_core::{
    BenchContext, BufferKind, CodecError, Fixture, FixtureSpec, JsonMapper, Operation,
    ParseSource, Person, SampleBuffer, SampleSize,
};

use crate::harness::{BenchmarkHarness, BenchmarkParams, HarnessError, IterationProfiler};
use crate::metrics::{BenchmarkReport, BenchmarkResult};
use crate::profiler::ResourceProfiler;

/// One point of the benchmark matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BenchmarkSpec {
    pub kind: BufferKind,
    pub source: ParseSource,
    pub operation: Operation,
    pub size: SampleSize,
}

impl BenchmarkSpec {
    /// All 32 benchmarks, grouped by sample size.
    pub fn all() -> Vec<Self> {
        let mut specs = Vec::with_capacity(32);
        for size in SampleSize::ALL {
            for operation in Operation::ALL {
                for kind in BufferKind::ALL {
                    for source in ParseSource::ALL {
                        specs.push(Self {
                            kind,
                            source,
                            operation,
                            size,
                        });
                    }
                }
            }
        }
        specs
    }

    pub fn name(&self) -> String {
        format!(
            "{}{}{}{}",
            self.kind.name(),
            self.source.name(),
            self.operation.name(),
            self.size
        )
    }

    /// Resolve a benchmark name back to its spec.
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|spec| spec.name() == name)
    }

    /// Report parameters: BufferType, ParseSource, Operation, Size, SizeUnit.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("BufferType".to_string(), self.kind.name().to_string()),
            ("ParseSource".to_string(), self.source.name().to_string()),
            ("Operation".to_string(), self.operation.name().to_string()),
            ("Size".to_string(), self.size.kilobytes().to_string()),
            ("SizeUnit".to_string(), "Kb".to_string()),
        ])
    }

    /// Whether this benchmark passes `filter`.
    pub fn matches(&self, filter: &IncludeFilter) -> bool {
        filter.is_match(&self.name())
    }

    pub fn fixture_spec(&self) -> FixtureSpec {
        FixtureSpec::new(self.size, self.kind)
    }

    /// Logical operations per invocation: every record, `loops` times.
    pub fn ops_per_invocation(&self, loops: u32, records: usize) -> u64 {
        loops as u64 * records as u64
    }

    /// One invocation: `loops` round trips of this benchmark's kind.
    ///
    /// Reads consume `view`, a private cursor over the sample; writes
    /// serialize `records`.
    pub fn invoke(
        &self,
        mapper: &JsonMapper,
        records: &[Person],
        view: &mut SampleBuffer,
        loops: u32,
    ) -> Result<(), CodecError> {
        match (self.source, self.operation) {
            (ParseSource::String, Operation::Read) => {
                for _ in 0..loops {
                    let people: Vec<Person> = mapper.read_str(&view.to_string_utf8())?;
                    black_box(people.len());
                    view.reset_reader_index();
                }
            }
            (ParseSource::Buffer, Operation::Read) => {
                for _ in 0..loops {
                    let people: Vec<Person> = mapper.read_buffer(view)?;
                    black_box(people.len());
                    view.reset_reader_index();
                }
            }
            (ParseSource::String, Operation::Write) => {
                for _ in 0..loops {
                    black_box(mapper.write_string(records)?);
                }
            }
            (ParseSource::Buffer, Operation::Write) => {
                for _ in 0..loops {
                    black_box(mapper.write_buffer(self.kind, records)?);
                }
            }
        }
        Ok(())
    }
}

/// Compiled include patterns.
///
/// Patterns are case-insensitive regular expressions searched anywhere in
/// the benchmark name, so a plain word works as a substring. A benchmark is
/// selected when any pattern matches; no patterns selects everything.
#[derive(Debug, Clone, Default)]
pub struct IncludeFilter {
    patterns: Vec<Regex>,
}

impl IncludeFilter {
    pub fn new(patterns: &[String]) -> Result<Self, HarnessError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| HarnessError::InvalidSettings {
                        reason: format!("include pattern {:?}: {}", pattern, e),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// A filter that selects every benchmark.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.is_match(name))
    }
}

impl fmt::Display for BenchmarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Runs the selected part of the matrix against a context.
pub struct SuiteRunner<'a> {
    ctx: &'a BenchContext,
    harness: BenchmarkHarness,
    loops_per_op: u32,
    include: IncludeFilter,
}

impl<'a> SuiteRunner<'a> {
    /// Runner configured from the context's harness settings.
    ///
    /// # Errors
    /// `InvalidSettings` if an include pattern is not a valid regex.
    pub fn new(ctx: &'a BenchContext) -> Result<Self, HarnessError> {
        let config = &ctx.config().harness;
        Ok(Self {
            ctx,
            harness: BenchmarkHarness::from_config(config),
            loops_per_op: config.loops_per_op,
            include: IncludeFilter::new(&config.include)?,
        })
    }

    pub fn harness(mut self, harness: BenchmarkHarness) -> Self {
        self.harness = harness;
        self
    }

    pub fn loops_per_op(mut self, loops: u32) -> Self {
        self.loops_per_op = loops;
        self
    }

    pub fn include(mut self, filter: IncludeFilter) -> Self {
        self.include = filter;
        self
    }

    /// Benchmarks that pass the include filter, in matrix order.
    pub fn selected(&self) -> Vec<BenchmarkSpec> {
        BenchmarkSpec::all()
            .into_iter()
            .filter(|spec| spec.matches(&self.include))
            .collect()
    }

    /// Run every selected benchmark and collect the report.
    ///
    /// The first failing benchmark stops the run.
    pub fn run(&self) -> Result<BenchmarkReport, HarnessError> {
        let selected = self.selected();
        tracing::info!(
            benchmarks = selected.len(),
            loops_per_op = self.loops_per_op,
            "Running benchmark suite"
        );

        let config = self.ctx.config();
        let mut report =
            BenchmarkReport::new().with_settings(&config.harness, &config.workload);
        let profiler = ResourceProfiler::new(self.ctx.sampler().clone());

        for spec in selected {
            let result = self.run_one(spec, &[&profiler])?;
            tracing::info!(
                benchmark = %result.name,
                score = result.score.mean,
                error = result.score.std_dev,
                "Benchmark complete"
            );
            report.add_result(result);
        }

        Ok(report)
    }

    /// Run a single benchmark with the given profilers.
    pub fn run_one(
        &self,
        spec: BenchmarkSpec,
        profilers: &[&dyn IterationProfiler],
    ) -> Result<BenchmarkResult, HarnessError> {
        let name = spec.name();
        let fixture =
            Fixture::setup(self.ctx, spec.fixture_spec()).map_err(|e| HarnessError::Setup {
                benchmark: name.clone(),
                message: e.to_string(),
            })?;

        let params = BenchmarkParams::new(
            name,
            spec.ops_per_invocation(self.loops_per_op, fixture.record_count()),
        );
        let mapper = self.ctx.mapper();
        let loops = self.loops_per_op;

        let run = self.harness.run_group(
            &params,
            profilers,
            |_| fixture.buffer_view(),
            |view: &mut SampleBuffer| spec.invoke(mapper, fixture.records(), view, loops),
        );

        let records = fixture.record_count();
        let payload = fixture.payload_len();
        fixture.teardown();

        Ok(BenchmarkResult::from_run(run?, spec.parameters())
            .with_metadata("records", records)
            .with_metadata("payload_bytes", payload)
            .with_metadata("loops_per_op", loops))
    }
}
