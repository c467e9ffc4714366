// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for jsonbench.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`
//! in the library - every failure is a named variant.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the benchmark core.
#[derive(Debug, Error)]
pub enum JsonBenchError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Initialization Errors - No Partial Sample Sets
    // =========================================================================
    #[error("Sample load error: {0}")]
    SampleLoad(#[from] SampleLoadError),

    // =========================================================================
    // Round-Trip Errors
    // =========================================================================
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    // =========================================================================
    // Resource Probe Errors
    // =========================================================================
    #[error("Resource probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors abort startup.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid environment override: {variable} = {value} - {reason}")]
    InvalidEnvOverride {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

/// Sample loading failures. Any of these prevents every benchmark from running.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    #[error("Sample resource not found: {name} (looked in {path})")]
    NotFound { name: String, path: PathBuf },

    #[error("Failed to read sample {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decompress sample {name}: {source}")]
    Decompress {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sample {name} decompressed to an empty payload")]
    Empty { name: String },

    #[error("Failed to build {kind} buffer for sample {name}: {source}")]
    Buffer {
        name: String,
        kind: &'static str,
        #[source]
        source: BufferError,
    },

    #[error("Unknown sample resource: {name}")]
    UnknownSample { name: String },
}

/// Failures of the JSON round-trip driver.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },

    /// The mapper rejected the input or failed to format the output.
    /// The structured `serde_json` cause is kept as the source.
    #[error("JSON processing failed: {source}")]
    Processing {
        #[from]
        source: serde_json::Error,
    },

    #[error("Output buffer allocation failed: {0}")]
    Buffer(#[from] BufferError),
}

impl CodecError {
    /// True for precondition failures, false for mapper failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CodecError::InvalidArgument { .. })
    }
}

/// Buffer allocation failures.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Failed to map direct buffer of {size} bytes: {reason}")]
    MapFailed { size: usize, reason: String },

    #[error("Buffer capacity exceeds maximum: {requested} > {max}")]
    CapacityExceeded { requested: usize, max: usize },
}

/// Failures reading process or thread counters.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("System call failed: {syscall} - {message}")]
    Syscall {
        syscall: &'static str,
        message: String,
    },

    #[error("No free allocation slot (max {max} tracked threads)")]
    SlotsExhausted { max: usize },

    #[error("Thread already holds allocation slot {slot}")]
    SlotHeld { slot: usize },
}

/// Result type alias using JsonBenchError.
pub type JsonBenchResult<T> = Result<T, JsonBenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::InvalidFieldValue {
            field: "threads",
            value: "0".to_string(),
            reason: "Must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("threads"));
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_error_chain() {
        let codec_err = CodecError::InvalidArgument {
            reason: "Incoming data was empty",
        };
        let err: JsonBenchError = codec_err.into();
        assert!(matches!(err, JsonBenchError::Codec(_)));
    }

    #[test]
    fn test_processing_error_keeps_cause() {
        let cause = serde_json::from_str::<Vec<u32>>("[1, oops]").unwrap_err();
        let line = cause.line();
        let err = CodecError::from(cause);

        assert!(!err.is_invalid_argument());
        let source = std::error::Error::source(&err).expect("cause should be preserved");
        let json_err = source
            .downcast_ref::<serde_json::Error>()
            .expect("cause should be a serde_json error");
        assert_eq!(json_err.line(), line);
        assert!(json_err.is_syntax());
    }
}
