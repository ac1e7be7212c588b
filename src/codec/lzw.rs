//! Variable-width LZW coder.
//!
//! Payload layout:
//! ```text
//! [original_length: u32 LE][codes, MSB-first]
//! ```
//! The dictionary starts with the 256 single-byte strings and grows by one
//! entry per emitted code until it holds [`MAX_CODES`] entries, after which it
//! is frozen. Code widths start at 9 bits and widen as the dictionary grows;
//! encoder and decoder derive the width of the i-th code from `i` alone, so no
//! width markers or clear codes appear in the stream.

use super::bitstream::{MsbBitReader, MsbBitWriter};
use super::{read_len_prefix, EntropyCodec};
use crate::error::{Result, SbwtError};
use crate::header::CodecId;
use log::debug;
use rustc_hash::FxHashMap;

/// LZW with a growing, eventually frozen dictionary
#[derive(Debug, Clone, Copy, Default)]
pub struct LzwCodec;

/// Dictionary capacity (16-bit codes)
pub const MAX_CODES: usize = 1 << 16;

const MIN_WIDTH: u8 = 9;
const LITERALS: usize = 256;

/// Bit width of the `index`-th emitted code.
///
/// Before code `index` the dictionary holds `256 + index` entries (capped),
/// and the decoder may legitimately see the one entry it has not built yet.
pub fn code_width(index: usize) -> u8 {
    let max_code = (LITERALS + index).min(MAX_CODES) - 1;
    let bits = (usize::BITS - max_code.leading_zeros()) as u8;
    bits.max(MIN_WIDTH)
}

impl EntropyCodec for LzwCodec {
    fn id(&self) -> CodecId {
        CodecId::Lzw
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let length = u32::try_from(data.len()).map_err(|_| {
            SbwtError::CompressionError(format!("lzw: block of {} bytes too large", data.len()))
        })?;
        let mut writer = MsbBitWriter::with_prefix(length.to_le_bytes().to_vec());
        let Some((&first, rest)) = data.split_first() else {
            return Ok(writer.into_vec());
        };

        let mut dictionary: FxHashMap<(u32, u8), u32> = FxHashMap::default();
        let mut next_code = LITERALS;
        let mut emitted = 0usize;
        let mut current = first as u32;

        for &byte in rest {
            if let Some(&code) = dictionary.get(&(current, byte)) {
                current = code;
                continue;
            }

            writer.write_bits(current, code_width(emitted));
            emitted += 1;
            if next_code < MAX_CODES {
                dictionary.insert((current, byte), next_code as u32);
                next_code += 1;
            }
            current = byte as u32;
        }

        writer.write_bits(current, code_width(emitted));
        emitted += 1;

        let out = writer.into_vec();
        debug!(
            "lzw: {} -> {} bytes ({} codes, {} dictionary entries)",
            data.len(),
            out.len(),
            emitted,
            next_code
        );
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let (expected, body) = read_len_prefix(payload, "lzw")?;
        let mut output = Vec::with_capacity(expected.min(1 << 24));
        if expected == 0 {
            return Ok(output);
        }

        let mut reader = MsbBitReader::new(body);
        let mut table = DecodeTable::new();
        let mut previous: Option<u32> = None;
        let mut index = 0usize;

        while output.len() < expected {
            let code = reader.read_bits(code_width(index))?;
            index += 1;

            match previous {
                None => {
                    if code as usize >= LITERALS {
                        return Err(SbwtError::CorruptPayload(format!(
                            "lzw: first code {} is not a literal",
                            code
                        )));
                    }
                    output.push(code as u8);
                }
                Some(prev) => {
                    let next = table.len();
                    let first = if (code as usize) < next {
                        table.emit(code, &mut output);
                        table.first[code as usize]
                    } else if code as usize == next && next < MAX_CODES {
                        // KwKwK: the string is prev + first(prev)
                        let first = table.first[prev as usize];
                        table.emit(prev, &mut output);
                        output.push(first);
                        first
                    } else {
                        return Err(SbwtError::CorruptPayload(format!(
                            "lzw: code {} beyond dictionary size {}",
                            code, next
                        )));
                    };
                    if next < MAX_CODES {
                        table.push(prev, first);
                    }
                }
            }
            previous = Some(code);
        }

        if output.len() != expected {
            return Err(SbwtError::CorruptPayload(format!(
                "lzw: decoded {} bytes, expected {}",
                output.len(),
                expected
            )));
        }
        Ok(output)
    }
}

/// Decoder dictionary as parallel arrays indexed by code
struct DecodeTable {
    prefix: Vec<u32>,
    suffix: Vec<u8>,
    first: Vec<u8>,
    length: Vec<u32>,
}

impl DecodeTable {
    fn new() -> Self {
        let mut table = Self {
            prefix: Vec::with_capacity(MAX_CODES),
            suffix: Vec::with_capacity(MAX_CODES),
            first: Vec::with_capacity(MAX_CODES),
            length: Vec::with_capacity(MAX_CODES),
        };
        for byte in 0..=255u8 {
            table.prefix.push(u32::MAX);
            table.suffix.push(byte);
            table.first.push(byte);
            table.length.push(1);
        }
        table
    }

    fn len(&self) -> usize {
        self.suffix.len()
    }

    /// Add the entry `string(prefix) + byte`
    fn push(&mut self, prefix: u32, byte: u8) {
        let p = prefix as usize;
        self.prefix.push(prefix);
        self.suffix.push(byte);
        self.first.push(self.first[p]);
        self.length.push(self.length[p] + 1);
    }

    /// Append the string for `code` to `output`
    fn emit(&self, code: u32, output: &mut Vec<u8>) {
        let start = output.len();
        let len = self.length[code as usize] as usize;
        output.resize(start + len, 0);

        let mut current = code;
        for slot in output[start..].iter_mut().rev() {
            *slot = self.suffix[current as usize];
            current = self.prefix[current as usize];
        }
    }
}
