// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `jbench inspect` command - One pass over every sample.
//!
//! Parses each sample from a string and from a buffer, serializes the
//! records back to a string and to both buffer kinds, then prints the
//! resource delta of each pass.

use std::path::Path;

use jsonbench_core::{BenchContext, BufferKind, Person, SpaceUnit, TimeUnit};

use super::load_config;

pub fn execute(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ctx = BenchContext::initialize(config)?;
    let mapper = ctx.mapper();
    let sampler = ctx.sampler();

    for sample in ctx.samples().iter() {
        let size = sample.size();
        let label = format!("Inspect{}", size);
        let baseline = sampler.snapshot()?;

        let text = String::from_utf8_lossy(sample.payload());
        let from_string: Vec<Person> = mapper.read_str(&text)?;
        tracing::info!(sample = %size, records = from_string.len(), "Parsed from string");

        for kind in BufferKind::ALL {
            let Some(buffer) = ctx.samples().buffer(kind, size) else {
                continue;
            };
            let from_buffer: Vec<Person> = mapper.read_buffer(&mut buffer.duplicate())?;
            tracing::info!(
                sample = %size,
                kind = %kind,
                records = from_buffer.len(),
                "Parsed from buffer"
            );
        }

        let json = mapper.write_string(&from_string)?;
        tracing::info!(sample = %size, bytes = json.len(), "Serialized to string");

        for kind in BufferKind::ALL {
            let out = mapper.write_buffer(kind, &from_string)?;
            tracing::info!(sample = %size, kind = %kind, bytes = out.len(), "Serialized to buffer");
        }

        let report = sampler.delta(&baseline, TimeUnit::Milliseconds, SpaceUnit::Kilobytes)?;
        sampler.record(&label, report);
    }

    println!("{}", ctx.shutdown());
    Ok(())
}
