// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `jbench samples` command - List the bundled sample payloads.

use std::path::Path;

use jsonbench_core::{BufferKind, JsonMapper, Person, SampleLoader};

use super::load_config;

pub fn execute(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let samples = SampleLoader::new(&config.data_dir).load_all()?;
    let mapper = JsonMapper::new();

    println!("╔══════════════════════════════════════════════════════════════════════════╗");
    println!("║                              SAMPLE PAYLOADS                             ║");
    println!("╠═══════════════════════╦════════════╦══════════════╦═════════╦════════════╣");
    println!("║ Resource              ║ Compressed ║ Payload      ║ Records ║ CRC32      ║");
    println!("╠═══════════════════════╬════════════╬══════════════╬═════════╬════════════╣");

    for sample in samples.iter() {
        let records = match samples.buffer(BufferKind::Heap, sample.size()) {
            Some(buffer) => {
                let people: Vec<Person> = mapper.read_buffer(&mut buffer.duplicate())?;
                people.len()
            }
            None => 0,
        };

        println!(
            "║ {:<21} ║ {:>10} ║ {:>12} ║ {:>7} ║ {:>10} ║",
            sample.name(),
            sample.compressed_len(),
            sample.payload().len(),
            records,
            format!("{:08x}", sample.checksum())
        );
    }

    println!("╚═══════════════════════╩════════════╩══════════════╩═════════╩════════════╝");
    println!();
    println!("Total: {} sample(s) from {}", samples.len(), config.data_dir.display());

    Ok(())
}
