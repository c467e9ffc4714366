// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use std::path::Path;

use jsonbench_core::{BenchConfig, ConfigLoader, JsonBenchResult};

pub mod inspect;
pub mod run;
pub mod samples;
pub mod validate;

/// The config file if one was given, otherwise defaults plus environment.
pub(crate) fn load_config(path: Option<&Path>) -> JsonBenchResult<BenchConfig> {
    match path {
        Some(path) => ConfigLoader::load_file(path),
        None => ConfigLoader::from_env(),
    }
}
