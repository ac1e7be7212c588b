//! Entropy coders behind a common encode/decode contract.
//!
//! Every coder is a stateless unit value; per-block tables live in the
//! payload it produces. [`codec_for`] maps a [`CodecId`] to its coder, so the
//! pipeline never branches on the codec itself.

pub mod arithmetic;
pub mod bitstream;
pub mod bzip2;
pub mod huffman;
pub mod lzw;

pub use arithmetic::ArithmeticCodec;
pub use bzip2::Bzip2Codec;
pub use huffman::HuffmanCodec;
pub use lzw::LzwCodec;

use crate::error::{Result, SbwtError};
use crate::header::CodecId;

/// Encode/decode contract shared by all entropy coders.
///
/// `decode(encode(x)) == x` for every input. `decode` fails with
/// `CorruptPayload` when the payload's own headers or tables are inconsistent.
pub trait EntropyCodec: Send + Sync {
    /// Id recorded in the container.
    fn id(&self) -> CodecId;

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Decode a payload that must expand to exactly `expected` bytes.
    ///
    /// The default suits coders whose payload opens with a u32 symbol count:
    /// the count is checked before any decoding work is done.
    fn decode_exact(&self, payload: &[u8], expected: usize) -> Result<Vec<u8>> {
        let (declared, _) = read_len_prefix(payload, self.id().name())?;
        check_len(self.id(), declared, expected)?;
        let decoded = self.decode(payload)?;
        check_len(self.id(), decoded.len(), expected)?;
        Ok(decoded)
    }
}

/// Coder for a codec id
pub fn codec_for(id: CodecId) -> &'static dyn EntropyCodec {
    match id {
        CodecId::Huffman => &HuffmanCodec,
        CodecId::Arithmetic => &ArithmeticCodec,
        CodecId::Lzw => &LzwCodec,
        CodecId::Bzip2 => &Bzip2Codec,
    }
}

/// Read a little-endian u32 length field from the front of a payload
pub(crate) fn read_len_prefix<'a>(payload: &'a [u8], what: &str) -> Result<(usize, &'a [u8])> {
    if payload.len() < 4 {
        return Err(SbwtError::CorruptPayload(format!(
            "{}: payload too short for length header",
            what
        )));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&payload[..4]);
    Ok((u32::from_le_bytes(buf) as usize, &payload[4..]))
}

pub(crate) fn check_len(codec: CodecId, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(SbwtError::CorruptPayload(format!(
            "{} payload holds {} bytes, header records {}",
            codec, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_roundtrip(id: CodecId, data: &[u8]) {
        let codec = codec_for(id);
        let encoded = codec.encode(data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(data, &decoded[..], "codec {} failed roundtrip", id);
    }

    #[test]
    fn test_dispatch_ids() {
        for id in CodecId::ALL {
            assert_eq!(codec_for(id).id(), id);
        }
    }

    #[test]
    fn test_empty_data() {
        for id in CodecId::ALL {
            test_roundtrip(id, b"");
        }
    }

    #[test]
    fn test_single_repeated_byte() {
        for id in CodecId::ALL {
            test_roundtrip(id, &[0u8; 1000]);
            test_roundtrip(id, b"z");
        }
    }

    #[test]
    fn test_full_alphabet() {
        let data: Vec<u8> = (0..4096).map(|i| (i * 7 % 256) as u8).collect();
        for id in CodecId::ALL {
            test_roundtrip(id, &data);
        }
    }

    #[test]
    fn test_text() {
        let data = b"Hello, World! This is a test of the entropy coders. ".repeat(50);
        for id in CodecId::ALL {
            test_roundtrip(id, &data);
        }
    }

    #[test]
    fn test_decode_exact() {
        let data = b"exact length decoding".repeat(8);
        for id in CodecId::ALL {
            let codec = codec_for(id);
            let encoded = codec.encode(&data).unwrap();
            assert_eq!(codec.decode_exact(&encoded, data.len()).unwrap(), data);
            assert!(matches!(
                codec.decode_exact(&encoded, data.len() - 1),
                Err(SbwtError::CorruptPayload(_))
            ));
        }
    }

    #[test]
    fn test_declared_count_checked_before_decoding() {
        // Payload claiming four billion symbols for a six-byte block
        let mut payload = u32::MAX.to_le_bytes().to_vec();
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.extend_from_slice(&[b'a', 1, 0]);
        for id in [CodecId::Huffman, CodecId::Arithmetic, CodecId::Lzw] {
            assert!(matches!(
                codec_for(id).decode_exact(&payload, 6),
                Err(SbwtError::CorruptPayload(_))
            ));
        }
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let data = b"a moderately long input so that every coder emits a body".repeat(4);
        for id in [CodecId::Huffman, CodecId::Arithmetic, CodecId::Lzw, CodecId::Bzip2] {
            let codec = codec_for(id);
            let encoded = codec.encode(&data).unwrap();
            let truncated = &encoded[..encoded.len() / 2];
            match codec.decode(truncated) {
                Err(_) => {}
                Ok(decoded) => assert_ne!(decoded, data, "codec {} accepted truncation", id),
            }
        }
    }
}
