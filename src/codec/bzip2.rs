//! Adapter for a standard bzip2 stream.
//!
//! The payload is a complete bzip2 stream produced by the `bzip2` crate, so
//! any bzip2 decoder can unpack it once the block transform is undone.

use super::{check_len, EntropyCodec};
use crate::error::{Result, SbwtError};
use crate::header::CodecId;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use log::debug;
use std::io::{Read, Write};

/// bzip2 block size level (1-9, in units of 100 KB)
const LEVEL: u32 = 9;

/// bzip2 through the system library binding
#[derive(Debug, Clone, Copy, Default)]
pub struct Bzip2Codec;

impl EntropyCodec for Bzip2Codec {
    fn id(&self) -> CodecId {
        CodecId::Bzip2
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::new(LEVEL));
        encoder
            .write_all(data)
            .map_err(|e| SbwtError::CompressionError(format!("bzip2: {}", e)))?;
        let out = encoder
            .finish()
            .map_err(|e| SbwtError::CompressionError(format!("bzip2: {}", e)))?;
        debug!("bzip2: {} -> {} bytes", data.len(), out.len());
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = BzDecoder::new(payload);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| SbwtError::CorruptPayload(format!("bzip2: {}", e)))?;
        Ok(out)
    }

    /// bzip2 carries no length of its own, so the decoder is cut off one
    /// byte past `expected` to catch an oversized stream without inflating it.
    fn decode_exact(&self, payload: &[u8], expected: usize) -> Result<Vec<u8>> {
        let mut decoder = BzDecoder::new(payload).take(expected as u64 + 1);
        let mut out = Vec::with_capacity(expected);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| SbwtError::CorruptPayload(format!("bzip2: {}", e)))?;
        check_len(self.id(), out.len(), expected)?;
        Ok(out)
    }
}
