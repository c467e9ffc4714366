// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Small typed vocabularies shared by the loader, driver and harness.
//!
//! Every axis of the benchmark matrix is a closed enum so that benchmark names
//! and report parameters are derived, never hand-typed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Nominal size class of a bundled sample payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SampleSize {
    Kb1,
    Kb56,
    Kb118,
    Kb614,
}

impl SampleSize {
    /// All samples, in load order.
    pub const ALL: [SampleSize; 4] = [
        SampleSize::Kb1,
        SampleSize::Kb56,
        SampleSize::Kb118,
        SampleSize::Kb614,
    ];

    /// Nominal size in kilobytes.
    pub const fn kilobytes(&self) -> u32 {
        match self {
            Self::Kb1 => 1,
            Self::Kb56 => 56,
            Self::Kb118 => 118,
            Self::Kb614 => 614,
        }
    }

    /// Resource file name under the `data/` namespace.
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Kb1 => "sample-1kb.json.gz",
            Self::Kb56 => "sample-56kb.json.gz",
            Self::Kb118 => "sample-118kb.json.gz",
            Self::Kb614 => "sample-614kb.json.gz",
        }
    }

    /// Resolve a resource file name back to its size class.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.file_name() == name)
    }
}

impl fmt::Display for SampleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Kb", self.kilobytes())
    }
}

/// Backing storage of a buffer representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BufferKind {
    /// Anonymous memory mapping outside the Rust heap.
    Direct,
    /// Ordinary heap allocation.
    Heap,
}

impl BufferKind {
    pub const ALL: [BufferKind; 2] = [BufferKind::Direct, BufferKind::Heap];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Heap => "Heap",
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which representation the JSON mapper consumes or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParseSource {
    String,
    Buffer,
}

impl ParseSource {
    pub const ALL: [ParseSource; 2] = [ParseSource::String, ParseSource::Buffer];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Buffer => "Buffer",
        }
    }
}

impl fmt::Display for ParseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of the round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Deserialize JSON into records.
    Read,
    /// Serialize records into JSON.
    Write,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::Read, Operation::Write];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Time unit used when rendering CPU and kernel time deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    const fn nanos_per_unit(&self) -> u64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => 1_000,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60 * 1_000_000_000,
            Self::Hours => 3_600 * 1_000_000_000,
            Self::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Convert nanoseconds into this unit, truncating.
    pub const fn from_nanos(&self, nanos: u64) -> u64 {
        nanos / self.nanos_per_unit()
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "µs",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ns" | "nanoseconds" => Ok(Self::Nanoseconds),
            "us" | "µs" | "microseconds" => Ok(Self::Microseconds),
            "ms" | "milliseconds" => Ok(Self::Milliseconds),
            "s" | "seconds" => Ok(Self::Seconds),
            "m" | "minutes" => Ok(Self::Minutes),
            "h" | "hours" => Ok(Self::Hours),
            "d" | "days" => Ok(Self::Days),
            _ => Err(HardValidationError::InvalidFieldValue {
                field: "time_unit",
                value: s.to_string(),
                reason: "Expected one of ns, us, ms, s, m, h, d".to_string(),
            }),
        }
    }
}

/// Space unit used when rendering allocated memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
    Terabytes,
}

impl SpaceUnit {
    const fn bytes_per_unit(&self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilobytes => 1 << 10,
            Self::Megabytes => 1 << 20,
            Self::Gigabytes => 1 << 30,
            Self::Terabytes => 1 << 40,
        }
    }

    /// Convert a byte count into this unit.
    pub fn from_bytes(&self, bytes: u64) -> f64 {
        bytes as f64 / self.bytes_per_unit() as f64
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Bytes => "B",
            Self::Kilobytes => "KB",
            Self::Megabytes => "MB",
            Self::Gigabytes => "GB",
            Self::Terabytes => "TB",
        }
    }
}

impl FromStr for SpaceUnit {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "bytes" => Ok(Self::Bytes),
            "kb" | "kilobytes" => Ok(Self::Kilobytes),
            "mb" | "megabytes" => Ok(Self::Megabytes),
            "gb" | "gigabytes" => Ok(Self::Gigabytes),
            "tb" | "terabytes" => Ok(Self::Terabytes),
            _ => Err(HardValidationError::InvalidFieldValue {
                field: "space_unit",
                value: s.to_string(),
                reason: "Expected one of b, kb, mb, gb, tb".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_file_names_round_trip() {
        for size in SampleSize::ALL {
            assert_eq!(SampleSize::from_file_name(size.file_name()), Some(size));
        }
        assert_eq!(SampleSize::from_file_name("sample-2kb.json.gz"), None);
    }

    #[test]
    fn test_sample_display() {
        assert_eq!(SampleSize::Kb118.to_string(), "118Kb");
        assert_eq!(SampleSize::Kb1.to_string(), "1Kb");
    }

    #[test]
    fn test_time_unit_truncates() {
        assert_eq!(TimeUnit::Milliseconds.from_nanos(1_999_999), 1);
        assert_eq!(TimeUnit::Seconds.from_nanos(999_999_999), 0);
        assert_eq!(TimeUnit::Nanoseconds.from_nanos(42), 42);
        assert_eq!(TimeUnit::Microseconds.symbol(), "µs");
    }

    #[test]
    fn test_space_unit_conversion() {
        assert!((SpaceUnit::Kilobytes.from_bytes(1536) - 1.5).abs() < f64::EPSILON);
        assert!((SpaceUnit::Megabytes.from_bytes(1 << 20) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("ms".parse::<TimeUnit>().unwrap(), TimeUnit::Milliseconds);
        assert_eq!("KB".parse::<SpaceUnit>().unwrap(), SpaceUnit::Kilobytes);
        assert!("fortnight".parse::<TimeUnit>().is_err());
    }
}
