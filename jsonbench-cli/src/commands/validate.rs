// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `jbench validate` command - Validate configuration file.

use std::path::Path;

use jsonbench_core::ConfigLoader;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    tracing::info!(file = %file.display(), "Validating configuration");

    match ConfigLoader::check_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Data Directory: {}", config.data_dir.display());
            println!();
            println!("Workload Settings:");
            println!("  Sample Size:        {}", config.workload.sample_size);
            println!("  Init Threads:       {}", config.workload.init_threads);
            println!("  Loops:              {}", config.workload.loops);
            println!();
            println!("Harness Settings:");
            println!("  Threads:            {}", config.harness.threads);
            println!(
                "  Warmup:             {} x {}ms",
                config.harness.warmup_iterations, config.harness.warmup_time_ms
            );
            println!(
                "  Measurement:        {} x {}ms",
                config.harness.measurement_iterations, config.harness.measurement_time_ms
            );
            println!("  Loops Per Op:       {}", config.harness.loops_per_op);
            println!("  Fail On Error:      {}", config.harness.fail_on_error);
            if !config.harness.include.is_empty() {
                println!("  Include:            {}", config.harness.include.join(", "));
            }
            println!(
                "  Result File:        {}",
                config.harness.result_file.display()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
