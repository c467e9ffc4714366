// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Buffer representations of sample payloads.
//!
//! A [`SampleBuffer`] is a cursor over shared, read-only bytes. Duplicates
//! share the bytes but own their reader index, so several readers can replay
//! the same payload without coordinating. The [`BufferWriter`] is the
//! growable write side used when serializing into a buffer.

mod region;

use std::io;

use bytes::{Bytes, BytesMut};

use crate::error::BufferError;
use crate::types::BufferKind;

pub use region::DirectRegion;

/// Read cursor over shared sample bytes.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    kind: BufferKind,
    data: Bytes,
    reader_index: usize,
    marked_reader_index: usize,
}

impl SampleBuffer {
    /// Wrap heap bytes.
    pub fn heap(data: impl Into<Bytes>) -> Self {
        Self::from_bytes(BufferKind::Heap, data.into())
    }

    /// Copy `data` into a fresh direct region.
    pub fn direct(data: &[u8]) -> Result<Self, BufferError> {
        let region = DirectRegion::from_slice(data)?;
        Ok(Self::from_bytes(BufferKind::Direct, Bytes::from_owner(region)))
    }

    /// Build a buffer of the requested kind holding a copy of `data`.
    pub fn copy_of(kind: BufferKind, data: &[u8]) -> Result<Self, BufferError> {
        match kind {
            BufferKind::Direct => Self::direct(data),
            BufferKind::Heap => Ok(Self::heap(Bytes::copy_from_slice(data))),
        }
    }

    fn from_bytes(kind: BufferKind, data: Bytes) -> Self {
        Self {
            kind,
            data,
            reader_index: 0,
            marked_reader_index: 0,
        }
    }

    /// Backing storage kind.
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// A new cursor over the same bytes, starting at this cursor's position.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Total number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn reader_index(&self) -> usize {
        self.reader_index
    }

    /// Bytes between the reader index and the end.
    pub fn readable_bytes(&self) -> usize {
        self.data.len() - self.reader_index
    }

    /// The readable region, without moving the cursor.
    pub fn readable(&self) -> &[u8] {
        &self.data[self.reader_index..]
    }

    /// Every byte of the buffer, regardless of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Advance the reader index. Clamps at the end of the buffer.
    pub fn skip_bytes(&mut self, count: usize) {
        self.reader_index = (self.reader_index + count).min(self.data.len());
    }

    /// Remember the current reader index for [`reset_reader_index`](Self::reset_reader_index).
    pub fn mark_reader_index(&mut self) {
        self.marked_reader_index = self.reader_index;
    }

    /// Move the reader index back to the last mark (initially zero).
    pub fn reset_reader_index(&mut self) {
        self.reader_index = self.marked_reader_index;
    }

    /// Decode the readable region as UTF-8, replacing invalid sequences.
    /// The cursor does not move.
    pub fn to_string_utf8(&self) -> String {
        String::from_utf8_lossy(self.readable()).into_owned()
    }
}

impl io::Read for SampleBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.readable();
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.reader_index += count;
        Ok(count)
    }
}

enum WriterStorage {
    Heap(BytesMut),
    Direct(DirectRegion),
}

/// Growable write-side buffer, frozen into a [`SampleBuffer`] when complete.
pub struct BufferWriter {
    storage: WriterStorage,
}

impl BufferWriter {
    /// Create a writer of the given kind with an initial capacity.
    pub fn with_capacity(kind: BufferKind, capacity: usize) -> Result<Self, BufferError> {
        let storage = match kind {
            BufferKind::Heap => WriterStorage::Heap(BytesMut::with_capacity(capacity)),
            BufferKind::Direct => WriterStorage::Direct(DirectRegion::allocate(capacity)?),
        };
        Ok(Self { storage })
    }

    pub fn kind(&self) -> BufferKind {
        match self.storage {
            WriterStorage::Heap(_) => BufferKind::Heap,
            WriterStorage::Direct(_) => BufferKind::Direct,
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        match &self.storage {
            WriterStorage::Heap(bytes) => bytes.len(),
            WriterStorage::Direct(region) => region.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finish writing and expose the bytes as a readable buffer.
    pub fn freeze(self) -> SampleBuffer {
        match self.storage {
            WriterStorage::Heap(bytes) => SampleBuffer::from_bytes(BufferKind::Heap, bytes.freeze()),
            WriterStorage::Direct(region) => {
                SampleBuffer::from_bytes(BufferKind::Direct, Bytes::from_owner(region))
            }
        }
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.storage {
            WriterStorage::Heap(bytes) => bytes.extend_from_slice(buf),
            WriterStorage::Direct(region) => region
                .extend_from_slice(buf)
                .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_duplicate_has_independent_cursor() {
        let original = SampleBuffer::heap(&b"[1,2,3]"[..]);
        let mut first = original.duplicate();
        let second = original.duplicate();

        first.skip_bytes(3);

        assert_eq!(first.readable_bytes(), 4);
        assert_eq!(second.readable_bytes(), 7);
        assert_eq!(original.reader_index(), 0);
    }

    #[test]
    fn test_mark_and_reset() {
        let mut buffer = SampleBuffer::heap(&b"abcdef"[..]);
        buffer.skip_bytes(2);
        buffer.mark_reader_index();
        buffer.skip_bytes(3);
        assert_eq!(buffer.readable(), b"f");

        buffer.reset_reader_index();
        assert_eq!(buffer.reader_index(), 2);
        assert_eq!(buffer.to_string_utf8(), "cdef");
    }

    #[test]
    fn test_skip_clamps() {
        let mut buffer = SampleBuffer::heap(&b"ab"[..]);
        buffer.skip_bytes(10);
        assert_eq!(buffer.readable_bytes(), 0);
    }

    #[test]
    fn test_direct_and_heap_hold_same_bytes() {
        let payload = br#"[{"name":"x"}]"#;
        let direct = SampleBuffer::copy_of(BufferKind::Direct, payload).unwrap();
        let heap = SampleBuffer::copy_of(BufferKind::Heap, payload).unwrap();

        assert_eq!(direct.kind(), BufferKind::Direct);
        assert_eq!(heap.kind(), BufferKind::Heap);
        assert_eq!(direct.as_bytes(), heap.as_bytes());
        assert_eq!(direct.len(), payload.len());
    }

    #[test]
    fn test_read_advances_cursor() {
        let mut buffer = SampleBuffer::heap(&b"hello"[..]);
        let mut out = [0u8; 3];
        assert_eq!(buffer.read(&mut out).unwrap(), 3);
        assert_eq!(&out, b"hel");
        assert_eq!(buffer.readable_bytes(), 2);
    }

    #[test]
    fn test_writer_grows_past_initial_capacity() {
        for kind in BufferKind::ALL {
            let mut writer = BufferWriter::with_capacity(kind, 8).unwrap();
            let chunk = [b'x'; 1000];
            for _ in 0..10 {
                writer.write_all(&chunk).unwrap();
            }
            assert_eq!(writer.kind(), kind);

            let buffer = writer.freeze();
            assert_eq!(buffer.kind(), kind);
            assert_eq!(buffer.len(), 10_000);
            assert!(buffer.as_bytes().iter().all(|&b| b == b'x'));
        }
    }

    #[test]
    fn test_lossy_utf8() {
        let buffer = SampleBuffer::heap(vec![b'o', b'k', 0xFF]);
        assert_eq!(buffer.to_string_utf8(), "ok\u{FFFD}");
    }
}
