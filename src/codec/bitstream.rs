//! MSB-first bit streams shared by the in-house entropy coders.

use crate::error::{Result, SbwtError};

/// MSB-first bit writer.
#[derive(Debug, Default)]
pub struct MsbBitWriter {
    /// Completed bytes.
    output: Vec<u8>,
    /// Partially filled byte (bits enter from the LSB side).
    current: u8,
    /// Number of bits held in `current`.
    filled: u8,
}

impl MsbBitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a bitstream after an already-written byte header.
    pub fn with_prefix(prefix: Vec<u8>) -> Self {
        Self {
            output: prefix,
            current: 0,
            filled: 0,
        }
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.current = (self.current << 1) | bit as u8;
        self.filled += 1;
        if self.filled == 8 {
            self.output.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Write the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        debug_assert!(count <= 32);
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Flush, zero-padding the final byte.
    pub fn into_vec(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.output.push(self.current << (8 - self.filled));
        }
        self.output
    }
}

/// MSB-first bit reader.
#[derive(Debug)]
pub struct MsbBitReader<'a> {
    data: &'a [u8],
    /// Index of the next bit to read.
    bit_pos: usize,
}

impl<'a> MsbBitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Number of bits left in the input.
    pub fn remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.bit_pos)
    }

    /// Read one bit, failing at end of input.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        self.try_read_bit().ok_or_else(|| {
            SbwtError::CorruptPayload(format!(
                "unexpected end of bitstream at bit {}",
                self.bit_pos
            ))
        })
    }

    /// Read one bit, or `None` at end of input.
    #[inline]
    pub fn try_read_bit(&mut self) -> Option<bool> {
        let byte = *self.data.get(self.bit_pos / 8)?;
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1 == 1;
        self.bit_pos += 1;
        Some(bit)
    }

    /// Read `count` bits as an unsigned value, most significant first.
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32);
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u32;
        }
        Ok(value)
    }
}
