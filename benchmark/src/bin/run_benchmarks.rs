// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run the benchmark matrix and write the JSON report.

use std::path::PathBuf;

use clap::Parser;
use jsonbench_benchmark::{render_table, JsonReporter, RunOverrides, SuiteRunner};
use jsonbench_core::{BenchContext, ConfigLoader, CountingAllocator};

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(name = "run_benchmarks")]
#[command(about = "Run jsonbench benchmarks and generate JSON reports")]
struct Args {
    /// Result file (defaults to the configured result file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only run benchmarks whose name matches one of these regexes
    #[arg(short, long)]
    include: Vec<String>,

    /// Worker threads per benchmark
    #[arg(short, long)]
    threads: Option<usize>,

    /// Measurement iterations per benchmark
    #[arg(long)]
    iterations: Option<u32>,

    /// Run in quick mode (short iterations, fewer loops)
    #[arg(long)]
    quick: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_env_filter("info").init();

    let overrides = RunOverrides {
        include: args.include,
        threads: args.threads,
        iterations: args.iterations,
        quick: args.quick,
        output: args.output,
    };
    let config = overrides.apply(ConfigLoader::from_env()?)?;

    println!("jsonbench Benchmark Suite");
    println!("=========================");
    println!("Result file: {}", config.harness.result_file.display());
    println!(
        "Threads: {}, iterations: {} x {}ms",
        config.harness.threads,
        config.harness.measurement_iterations,
        config.harness.measurement_time_ms
    );
    println!();

    let result_file = config.harness.result_file.clone();
    let ctx = BenchContext::initialize(config)?;

    let runner = SuiteRunner::new(&ctx)?;
    if runner.selected().is_empty() {
        anyhow::bail!("No benchmark matches the include filter");
    }

    let report = runner.run()?;
    drop(runner);
    JsonReporter::write_to(&report, &result_file)?;

    println!();
    println!("{}", render_table(&report));
    println!();
    println!("{}", ctx.shutdown());
    println!();
    println!("Benchmark report saved to: {}", result_file.display());

    Ok(())
}
