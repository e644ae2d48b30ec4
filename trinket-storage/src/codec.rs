//! On-disk encoding: named MessagePack wrapped in gzip.
//!
//! The gzip header carries no timestamp or file name, so equal records
//! always compress to equal bytes and their digests can be compared.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::path::Path;
use trinket_types::CapabilityRecord;

use crate::error::{StorageError, StorageResult};

/// Encodes and compresses a record.
pub fn encode(record: &CapabilityRecord) -> StorageResult<Vec<u8>> {
    let raw = record.encode()?;
    let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
    encoder.write_all(&raw)?;
    Ok(encoder.finish()?)
}

/// Decompresses and decodes bytes read from `path`. Any failure is reported
/// as [`StorageError::Corrupt`].
pub fn decode(path: &Path, bytes: &[u8]) -> StorageResult<CapabilityRecord> {
    let corrupt = |reason: String| StorageError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let mut raw = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut raw)
        .map_err(|e| corrupt(format!("gzip: {e}")))?;
    CapabilityRecord::decode(&raw).map_err(|e| corrupt(e.to_string()))
}
