use crate::error::{Result, SbwtError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magic bytes opening every container
pub const CONTAINER_MAGIC: &[u8; 4] = b"SBWT";

/// Current container format version
pub const CONTAINER_VERSION: u8 = 1;

/// Header flag: a 32-byte integrity tag follows the fixed header
pub const FLAG_TAG: u8 = 0x01;

/// Size of the integrity tag in bytes (HMAC-SHA3-256)
pub const TAG_SIZE: usize = 32;

/// Entropy coder options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodecId {
    #[default]
    Huffman,
    Arithmetic,
    Lzw,
    Bzip2,
}

impl CodecId {
    /// All codecs, in id order
    pub const ALL: [CodecId; 4] = [
        CodecId::Huffman,
        CodecId::Arithmetic,
        CodecId::Lzw,
        CodecId::Bzip2,
    ];

    /// Stable numeric id persisted in the container
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Huffman => 1,
            Self::Arithmetic => 2,
            Self::Lzw => 3,
            Self::Bzip2 => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Huffman => "huffman",
            Self::Arithmetic => "arithmetic",
            Self::Lzw => "lzw",
            Self::Bzip2 => "bzip2",
        }
    }
}

impl TryFrom<u8> for CodecId {
    type Error = SbwtError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Huffman),
            2 => Ok(Self::Arithmetic),
            3 => Ok(Self::Lzw),
            4 => Ok(Self::Bzip2),
            other => Err(SbwtError::UnsupportedCodec(other)),
        }
    }
}

impl std::str::FromStr for CodecId {
    type Err = SbwtError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "huffman" => Ok(Self::Huffman),
            "arithmetic" => Ok(Self::Arithmetic),
            "lzw" => Ok(Self::Lzw),
            "bzip2" | "bz2" => Ok(Self::Bzip2),
            _ => Err(SbwtError::UnsupportedAlgorithm(format!("codec: {}", s))),
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Fixed-size container header
/// Layout: [magic: 4][version: 1][codec: 1][flags: 1][reserved: 1]
///         [original_length: 4][primary_index: 4][payload_length: 4]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u8,
    pub codec: CodecId,
    pub flags: u8,
    /// Length of the original block in bytes
    pub original_length: u32,
    /// Row index of the original rotation, obscured by the key schedule
    pub primary_index: u32,
    /// Length of the encoded payload in bytes
    pub payload_length: u32,
}

impl ContainerHeader {
    pub const SIZE: usize = 20;

    pub fn new(codec: CodecId, original_length: u32, primary_index: u32, payload_length: u32) -> Self {
        Self {
            version: CONTAINER_VERSION,
            codec,
            flags: 0,
            original_length,
            primary_index,
            payload_length,
        }
    }

    pub fn has_tag(&self) -> bool {
        self.flags & FLAG_TAG != 0
    }

    /// Bytes that follow the fixed header: optional tag plus payload
    pub fn body_len(&self) -> usize {
        let tag = if self.has_tag() { TAG_SIZE } else { 0 };
        tag + self.payload_length as usize
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(CONTAINER_MAGIC);
        buf[4] = self.version;
        buf[5] = self.codec.as_u8();
        buf[6] = self.flags;
        buf[8..12].copy_from_slice(&self.original_length.to_le_bytes());
        buf[12..16].copy_from_slice(&self.primary_index.to_le_bytes());
        buf[16..20].copy_from_slice(&self.payload_length.to_le_bytes());
        buf
    }

    /// Deserialize header from bytes
    /// Validates magic, version, codec and flags before any payload is read
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(SbwtError::InvalidFormat("Header too short".into()));
        }
        if &data[0..4] != CONTAINER_MAGIC {
            return Err(SbwtError::InvalidFormat("Invalid container magic bytes".into()));
        }
        let version = data[4];
        if version != CONTAINER_VERSION {
            return Err(SbwtError::InvalidFormat(format!(
                "Unsupported container version {}",
                version
            )));
        }
        let codec = CodecId::try_from(data[5])?;
        let flags = data[6];
        if flags & !FLAG_TAG != 0 {
            return Err(SbwtError::InvalidFormat(format!("Unknown header flags 0x{:02x}", flags)));
        }
        let original_length = read_u32(&data[8..12]);
        let primary_index = read_u32(&data[12..16]);
        let payload_length = read_u32(&data[16..20]);

        if original_length > 0 && primary_index >= original_length {
            return Err(SbwtError::InvalidFormat(format!(
                "Primary index {} out of range for block of {} bytes",
                primary_index, original_length
            )));
        }

        Ok(Self {
            version,
            codec,
            flags,
            original_length,
            primary_index,
            payload_length,
        })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = ContainerHeader::new(CodecId::Lzw, 6, 3, 17);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], CONTAINER_MAGIC);
        let restored = ContainerHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, restored);
        assert_eq!(restored.body_len(), 17);
    }

    #[test]
    fn test_header_with_tag_flag() {
        let mut header = ContainerHeader::new(CodecId::Huffman, 10, 0, 4);
        header.flags = FLAG_TAG;
        let restored = ContainerHeader::from_bytes(&header.to_bytes()).unwrap();
        assert!(restored.has_tag());
        assert_eq!(restored.body_len(), TAG_SIZE + 4);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = ContainerHeader::new(CodecId::Huffman, 1, 0, 1).to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            ContainerHeader::from_bytes(&bytes),
            Err(SbwtError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unknown_codec_rejected() {
        let mut bytes = ContainerHeader::new(CodecId::Huffman, 1, 0, 1).to_bytes();
        bytes[5] = 99;
        assert!(matches!(
            ContainerHeader::from_bytes(&bytes),
            Err(SbwtError::UnsupportedCodec(99))
        ));
    }

    #[test]
    fn test_index_out_of_range_rejected() {
        let bytes = ContainerHeader::new(CodecId::Huffman, 4, 4, 1).to_bytes();
        assert!(ContainerHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_codec_parsing() {
        assert_eq!("huffman".parse::<CodecId>().unwrap(), CodecId::Huffman);
        assert_eq!("Arithmetic".parse::<CodecId>().unwrap(), CodecId::Arithmetic);
        assert_eq!("LZW".parse::<CodecId>().unwrap(), CodecId::Lzw);
        assert_eq!("bz2".parse::<CodecId>().unwrap(), CodecId::Bzip2);
        assert!("zstd".parse::<CodecId>().is_err());
    }

    #[test]
    fn test_codec_ids_are_stable() {
        for codec in CodecId::ALL {
            assert_eq!(CodecId::try_from(codec.as_u8()).unwrap(), codec);
            assert_eq!(codec.to_string().parse::<CodecId>().unwrap(), codec);
        }
        assert!(CodecId::try_from(0).is_err());
    }
}
