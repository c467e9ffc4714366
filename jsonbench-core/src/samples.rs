// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sample data loader.
//!
//! Decompresses the bundled gzip payloads once and exposes each of them as a
//! direct and a heap [`SampleBuffer`]. Loading is all-or-nothing: a missing or
//! corrupt resource fails initialization.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use flate2::read::GzDecoder;

use crate::buffer::SampleBuffer;
use crate::error::SampleLoadError;
use crate::types::{BufferKind, SampleSize};

/// Decompressed output is pre-sized at this multiple of the compressed length.
const DECOMPRESSION_RATIO_HINT: usize = 20;

/// One decompressed sample payload.
#[derive(Debug, Clone)]
pub struct Sample {
    size: SampleSize,
    compressed_len: u64,
    payload: Bytes,
    checksum: u32,
}

impl Sample {
    pub fn size(&self) -> SampleSize {
        self.size
    }

    /// Resource file name.
    pub fn name(&self) -> &'static str {
        self.size.file_name()
    }

    pub fn compressed_len(&self) -> u64 {
        self.compressed_len
    }

    /// The decompressed JSON bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// CRC32 of the decompressed payload.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }
}

/// All loaded samples with their direct and heap buffers.
#[derive(Debug)]
pub struct SampleSet {
    samples: BTreeMap<SampleSize, Sample>,
    direct: BTreeMap<SampleSize, SampleBuffer>,
    heap: BTreeMap<SampleSize, SampleBuffer>,
}

impl SampleSet {
    pub fn get(&self, size: SampleSize) -> Option<&Sample> {
        self.samples.get(&size)
    }

    /// Look a sample up by its resource file name.
    pub fn by_name(&self, name: &str) -> Option<&Sample> {
        SampleSize::from_file_name(name).and_then(|size| self.get(size))
    }

    /// The shared buffer of the given kind. Callers read through a duplicate.
    pub fn buffer(&self, kind: BufferKind, size: SampleSize) -> Option<&SampleBuffer> {
        match kind {
            BufferKind::Direct => self.direct.get(&size),
            BufferKind::Heap => self.heap.get(&size),
        }
    }

    /// Samples in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.values()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Loads samples from a resource directory.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    data_dir: PathBuf,
}

impl SampleLoader {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// The `data/` directory bundled with this crate.
    pub fn default_location() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load and decompress a single sample.
    pub fn load(&self, size: SampleSize) -> Result<Sample, SampleLoadError> {
        let name = size.file_name();
        let path = self.data_dir.join(name);

        if !path.is_file() {
            return Err(SampleLoadError::NotFound {
                name: name.to_string(),
                path: self.data_dir.clone(),
            });
        }

        let file = File::open(&path).map_err(|e| SampleLoadError::Read {
            name: name.to_string(),
            source: e,
        })?;
        let compressed_len = file
            .metadata()
            .map_err(|e| SampleLoadError::Read {
                name: name.to_string(),
                source: e,
            })?
            .len();

        let mut decoded = Vec::with_capacity(compressed_len as usize * DECOMPRESSION_RATIO_HINT);
        GzDecoder::new(BufReader::new(file))
            .read_to_end(&mut decoded)
            .map_err(|e| SampleLoadError::Decompress {
                name: name.to_string(),
                source: e,
            })?;

        if decoded.is_empty() {
            return Err(SampleLoadError::Empty {
                name: name.to_string(),
            });
        }
        decoded.shrink_to_fit();

        let checksum = crc32fast::hash(&decoded);

        tracing::info!(
            sample = %name,
            compressed = compressed_len,
            decompressed = decoded.len(),
            checksum = %format!("{:#010x}", checksum),
            "Loaded sample"
        );

        Ok(Sample {
            size,
            compressed_len,
            payload: Bytes::from(decoded),
            checksum,
        })
    }

    /// Load a sample by resource file name.
    pub fn load_named(&self, name: &str) -> Result<Sample, SampleLoadError> {
        let size = SampleSize::from_file_name(name).ok_or_else(|| SampleLoadError::UnknownSample {
            name: name.to_string(),
        })?;
        self.load(size)
    }

    /// Load every sample and build both buffer representations.
    pub fn load_all(&self) -> Result<SampleSet, SampleLoadError> {
        let mut samples = BTreeMap::new();
        let mut direct = BTreeMap::new();
        let mut heap = BTreeMap::new();

        for size in SampleSize::ALL {
            let sample = self.load(size)?;

            let direct_buffer =
                SampleBuffer::direct(sample.payload()).map_err(|e| SampleLoadError::Buffer {
                    name: sample.name().to_string(),
                    kind: BufferKind::Direct.name(),
                    source: e,
                })?;
            direct.insert(size, direct_buffer);
            heap.insert(size, SampleBuffer::heap(sample.payload().clone()));
            samples.insert(size, sample);
        }

        Ok(SampleSet {
            samples,
            direct,
            heap,
        })
    }
}
