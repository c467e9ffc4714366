// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Round-trip driver over `serde_json`.
//!
//! Thin, synchronous delegation: argument checks, one mapper call, error
//! conversion. Buffer reads restore the caller's cursor so a shared fixture
//! buffer can be replayed across iterations.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::buffer::{BufferWriter, SampleBuffer};
use crate::error::CodecError;
use crate::types::BufferKind;

/// JSON mapper used by every benchmark operation.
#[derive(Debug, Clone)]
pub struct JsonMapper {
    /// Initial capacity of buffers produced by [`write_buffer`](Self::write_buffer).
    buffer_capacity: usize,
}

impl JsonMapper {
    /// Initial capacity of serialization buffers.
    pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

    /// Minimum readable bytes for a buffer to be worth parsing.
    pub const MIN_READABLE_BYTES: usize = 2;

    pub fn new() -> Self {
        Self {
            buffer_capacity: Self::DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Set the initial capacity of serialization buffers.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Deserialize a JSON string.
    ///
    /// # Errors
    /// `InvalidArgument` for empty input, `Processing` for anything the mapper rejects.
    pub fn read_str<T: DeserializeOwned>(&self, json: &str) -> Result<T, CodecError> {
        if json.is_empty() {
            return Err(CodecError::InvalidArgument {
                reason: "Incoming data was empty",
            });
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Deserialize the readable region of a buffer.
    ///
    /// The reader index and the caller's mark are the same after the call as
    /// before it, whether the parse succeeded or not.
    ///
    /// # Errors
    /// `InvalidArgument` when fewer than two bytes are readable, `Processing`
    /// for anything the mapper rejects.
    pub fn read_buffer<T: DeserializeOwned>(&self, buffer: &mut SampleBuffer) -> Result<T, CodecError> {
        if buffer.readable_bytes() < Self::MIN_READABLE_BYTES {
            return Err(CodecError::InvalidArgument {
                reason: "Incoming data was empty or shorter than 2 bytes",
            });
        }

        // Parses a borrowed view, so neither the reader index nor the mark moves
        Ok(serde_json::from_slice(buffer.readable())?)
    }

    /// Serialize into a string.
    pub fn write_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    /// Serialize into a fresh buffer of the requested kind.
    pub fn write_buffer<T: Serialize + ?Sized>(
        &self,
        kind: BufferKind,
        value: &T,
    ) -> Result<SampleBuffer, CodecError> {
        let mut writer = BufferWriter::with_capacity(kind, self.buffer_capacity)?;
        serde_json::to_writer(&mut writer, value)?;
        Ok(writer.freeze())
    }
}

impl Default for JsonMapper {
    fn default() -> Self {
        Self::new()
    }
}
