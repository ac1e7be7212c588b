//! Static-model binary arithmetic coder.
//!
//! Payload layout:
//! ```text
//! [symbol_count: u32 LE][nsym: u16 LE][(symbol: u8, freq: u16 LE) * nsym][code bits]
//! ```
//! Frequencies are scaled so their total stays within [`MAX_TOTAL`] plus one
//! per present symbol; every present symbol keeps a nonzero frequency. The
//! coder is the 32-bit integer range coder with underflow (E3) handling.

use super::bitstream::{MsbBitReader, MsbBitWriter};
use super::{read_len_prefix, EntropyCodec};
use crate::error::{Result, SbwtError};
use crate::header::CodecId;
use log::debug;

/// Static arithmetic coding with the frequency table stored in the payload
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticCodec;

const CODE_BITS: u32 = 32;
const TOP: u64 = (1 << CODE_BITS) - 1;
const HALF: u64 = 1 << (CODE_BITS - 1);
const QUARTER: u64 = 1 << (CODE_BITS - 2);

/// Target total of the scaled frequency table
pub const MAX_TOTAL: u64 = 1 << 15;

/// Largest total a decoder will accept
const MAX_DECODE_TOTAL: u64 = 1 << 16;

const ENTRY_SIZE: usize = 3;

/// Cumulative frequency table: `cum[s]..cum[s + 1]` is the interval of `s`
struct Model {
    cum: [u64; 257],
}

impl Model {
    fn from_freqs(freqs: &[u64; 256]) -> Self {
        let mut cum = [0u64; 257];
        for s in 0..256 {
            cum[s + 1] = cum[s] + freqs[s];
        }
        Self { cum }
    }

    fn total(&self) -> u64 {
        self.cum[256]
    }

    fn interval(&self, symbol: u8) -> (u64, u64) {
        (self.cum[symbol as usize], self.cum[symbol as usize + 1])
    }

    /// Symbol whose interval contains `scaled`
    fn lookup(&self, scaled: u64) -> u8 {
        (self.cum.partition_point(|&c| c <= scaled) - 1) as u8
    }
}

impl EntropyCodec for ArithmeticCodec {
    fn id(&self) -> CodecId {
        CodecId::Arithmetic
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let count = u32::try_from(data.len()).map_err(|_| {
            SbwtError::CompressionError(format!(
                "arithmetic: block of {} bytes too large",
                data.len()
            ))
        })?;

        let freqs = scaled_frequencies(data);
        let present: Vec<usize> = (0..256).filter(|&s| freqs[s] > 0).collect();

        let mut header = Vec::with_capacity(6 + present.len() * ENTRY_SIZE);
        header.extend_from_slice(&count.to_le_bytes());
        header.extend_from_slice(&(present.len() as u16).to_le_bytes());
        for &s in &present {
            header.push(s as u8);
            header.extend_from_slice(&(freqs[s] as u16).to_le_bytes());
        }

        let mut writer = MsbBitWriter::with_prefix(header);
        if data.is_empty() {
            return Ok(writer.into_vec());
        }

        let model = Model::from_freqs(&freqs);
        let total = model.total();
        let mut low = 0u64;
        let mut high = TOP;
        let mut pending = 0u64;

        for &b in data {
            let (cum_low, cum_high) = model.interval(b);
            let range = high - low + 1;
            high = low + range * cum_high / total - 1;
            low += range * cum_low / total;

            loop {
                if high < HALF {
                    emit(&mut writer, false, &mut pending);
                } else if low >= HALF {
                    emit(&mut writer, true, &mut pending);
                    low -= HALF;
                    high -= HALF;
                } else if low >= QUARTER && high < 3 * QUARTER {
                    pending += 1;
                    low -= QUARTER;
                    high -= QUARTER;
                } else {
                    break;
                }
                low <<= 1;
                high = (high << 1) | 1;
            }
        }

        // Two more bits pin a value inside the final interval
        pending += 1;
        emit(&mut writer, low >= QUARTER, &mut pending);

        let out = writer.into_vec();
        debug!("arithmetic: {} -> {} bytes", data.len(), out.len());
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let (count, rest) = read_len_prefix(payload, "arithmetic")?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let (model, body) = read_model(rest)?;
        let total = model.total();

        let mut reader = MsbBitReader::new(body);
        let mut next_bit = || reader.try_read_bit().unwrap_or(false) as u64;

        let mut value = 0u64;
        for _ in 0..CODE_BITS {
            value = (value << 1) | next_bit();
        }
        let mut low = 0u64;
        let mut high = TOP;

        let mut output = Vec::with_capacity(count.min(1 << 24));
        for _ in 0..count {
            if value < low || value > high {
                return Err(SbwtError::CorruptPayload(
                    "arithmetic: code value left the coding interval".into(),
                ));
            }
            let range = high - low + 1;
            let scaled = ((value - low + 1) * total - 1) / range;
            if scaled >= total {
                return Err(SbwtError::CorruptPayload(
                    "arithmetic: scaled value outside frequency table".into(),
                ));
            }

            let symbol = model.lookup(scaled);
            output.push(symbol);

            let (cum_low, cum_high) = model.interval(symbol);
            high = low + range * cum_high / total - 1;
            low += range * cum_low / total;

            loop {
                if high < HALF {
                    // nothing to strip
                } else if low >= HALF {
                    low -= HALF;
                    high -= HALF;
                    value -= HALF;
                } else if low >= QUARTER && high < 3 * QUARTER {
                    low -= QUARTER;
                    high -= QUARTER;
                    value -= QUARTER;
                } else {
                    break;
                }
                low <<= 1;
                high = (high << 1) | 1;
                value = (value << 1) | next_bit();
            }
        }

        Ok(output)
    }
}

fn emit(writer: &mut MsbBitWriter, bit: bool, pending: &mut u64) {
    writer.write_bit(bit);
    for _ in 0..*pending {
        writer.write_bit(!bit);
    }
    *pending = 0;
}

/// Byte frequencies scaled toward [`MAX_TOTAL`], never dropping a present byte
fn scaled_frequencies(data: &[u8]) -> [u64; 256] {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    if data.is_empty() {
        return counts;
    }

    let n = data.len() as u64;
    let mut scaled = [0u64; 256];
    for (slot, &c) in scaled.iter_mut().zip(counts.iter()) {
        if c > 0 {
            *slot = (c * MAX_TOTAL / n).max(1);
        }
    }
    scaled
}

/// Parse and validate the frequency table
fn read_model(data: &[u8]) -> Result<(Model, &[u8])> {
    if data.len() < 2 {
        return Err(SbwtError::CorruptPayload(
            "arithmetic: missing symbol table".into(),
        ));
    }
    let nsym = u16::from_le_bytes([data[0], data[1]]) as usize;
    if nsym == 0 || nsym > 256 {
        return Err(SbwtError::CorruptPayload(format!(
            "arithmetic: invalid symbol table size {}",
            nsym
        )));
    }

    let table_len = nsym * ENTRY_SIZE;
    let table = data.get(2..2 + table_len).ok_or_else(|| {
        SbwtError::CorruptPayload("arithmetic: truncated symbol table".into())
    })?;

    let mut freqs = [0u64; 256];
    let mut previous: Option<u8> = None;
    for entry in table.chunks_exact(ENTRY_SIZE) {
        let symbol = entry[0];
        let freq = u16::from_le_bytes([entry[1], entry[2]]) as u64;
        if previous.is_some_and(|p| p >= symbol) {
            return Err(SbwtError::CorruptPayload(
                "arithmetic: symbol table not strictly ascending".into(),
            ));
        }
        if freq == 0 {
            return Err(SbwtError::CorruptPayload(format!(
                "arithmetic: zero frequency for symbol {}",
                symbol
            )));
        }
        freqs[symbol as usize] = freq;
        previous = Some(symbol);
    }

    let model = Model::from_freqs(&freqs);
    if model.total() > MAX_DECODE_TOTAL {
        return Err(SbwtError::CorruptPayload(format!(
            "arithmetic: frequency total {} too large",
            model.total()
        )));
    }

    Ok((model, &data[2 + table_len..]))
}
