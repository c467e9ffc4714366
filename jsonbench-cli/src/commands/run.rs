// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `jbench run` command - Run the benchmark suite.

use std::path::{Path, PathBuf};

use jsonbench_benchmark::{render_table, JsonReporter, RunOverrides, SuiteRunner};
use jsonbench_core::BenchContext;

use super::load_config;

pub fn execute(
    config_path: Option<&Path>,
    include: Vec<String>,
    threads: Option<usize>,
    quick: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let overrides = RunOverrides {
        include,
        threads,
        iterations: None,
        quick,
        output,
    };
    let config = overrides.apply(load_config(config_path)?)?;

    let result_file = config.harness.result_file.clone();
    let ctx = BenchContext::initialize(config)?;

    let runner = SuiteRunner::new(&ctx)?;
    if runner.selected().is_empty() {
        anyhow::bail!("No benchmark matches the include filter");
    }

    let report = runner.run()?;
    drop(runner);
    JsonReporter::write_to(&report, &result_file)?;

    println!("{}", render_table(&report));
    println!();
    println!("{}", ctx.shutdown());
    println!();
    println!("Report: {}", result_file.display());

    Ok(())
}
