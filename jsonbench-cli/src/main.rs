// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! jsonbench CLI
//!
//! Command-line interface for the JSON mapping benchmarks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jsonbench_core::CountingAllocator;

mod commands;

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

/// jsonbench - JSON serialization throughput benchmarks
#[derive(Parser)]
#[command(name = "jbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (environment and defaults if omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the benchmark suite and write the JSON report
    Run {
        /// Only run benchmarks whose name matches this regex (repeatable)
        #[arg(short, long)]
        include: Vec<String>,

        /// Worker threads per benchmark
        #[arg(short, long)]
        threads: Option<usize>,

        /// Short iterations for a quick look
        #[arg(long)]
        quick: bool,

        /// Result file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse and serialize every sample once, logging each step
    Inspect,

    /// List the loaded samples
    Samples,

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            include,
            threads,
            quick,
            output,
        } => commands::run::execute(config, include, threads, quick, output),
        Commands::Inspect => commands::inspect::execute(config),
        Commands::Samples => commands::samples::execute(config),
        Commands::Validate { file } => commands::validate::execute(&file),
    }
}
