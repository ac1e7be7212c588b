use crate::codec::codec_for;
use crate::container::Container;
use crate::error::{Result, SbwtError};
use crate::header::CodecId;
use crate::pipeline::{
    block_key, compute_tag, forward, inverse, mtf_decode, mtf_encode, validate_key, verify_tag,
    TransformedBlock,
};
use log::{debug, warn};
use rayon::prelude::*;

/// Default archive block size (64 KiB)
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Largest accepted archive block size (64 MiB)
pub const MAX_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Validate an archive block size
pub fn validate_block_size(block_size: usize) -> Result<()> {
    if block_size == 0 || block_size > MAX_BLOCK_SIZE {
        return Err(SbwtError::InvalidBlockSize(block_size));
    }
    Ok(())
}

/// Compress one block into a container
/// Pipeline: SBWT → MTF → entropy coder
pub fn compress(input: &[u8], key: &[u8], codec: CodecId) -> Result<Container> {
    compress_block(input, key, codec, false)
}

/// Compress one block and store an integrity tag of the original bytes
pub fn compress_tagged(input: &[u8], key: &[u8], codec: CodecId) -> Result<Container> {
    compress_block(input, key, codec, true)
}

fn compress_block(input: &[u8], key: &[u8], codec: CodecId, tag: bool) -> Result<Container> {
    validate_key(key)?;
    let original_length = u32::try_from(input.len()).map_err(|_| {
        SbwtError::CompressionError(format!(
            "block of {} bytes exceeds the container limit",
            input.len()
        ))
    })?;

    // Step 1: keyed block transform
    let transformed = forward(input, key)?;

    // Step 2: move-to-front
    let ranked = mtf_encode(&transformed.data);

    // Step 3: entropy coder
    let payload = codec_for(codec).encode(&ranked)?;

    let tag = tag.then(|| compute_tag(input, key));
    debug!(
        "compress: {} bytes -> {} byte {} payload",
        input.len(),
        payload.len(),
        codec
    );

    Container::new(
        codec,
        original_length,
        transformed.primary_index as u32,
        tag,
        payload,
    )
}

/// Recover the original block from a container
///
/// Without an integrity tag a wrong key is not detected and yields unrelated
/// bytes of the right length.
pub fn decompress(container: &Container, key: &[u8]) -> Result<Vec<u8>> {
    validate_key(key)?;
    let codec = container.codec();
    let expected = container.original_length();
    if expected > MAX_BLOCK_SIZE {
        return Err(SbwtError::CorruptPayload(format!(
            "header records a {} byte block, limit is {}",
            expected, MAX_BLOCK_SIZE
        )));
    }

    // Step 1: entropy decode by the recorded codec, bounded by the header length
    let ranked = codec_for(codec).decode_exact(&container.payload, expected)?;

    // Step 2: inverse move-to-front
    let transformed = TransformedBlock {
        data: mtf_decode(&ranked),
        primary_index: container.header.primary_index as usize,
    };

    // Step 3: inverse block transform
    let output = inverse(&transformed, key)?;

    if let Some(tag) = &container.tag {
        if !verify_tag(&output, key, tag) {
            warn!("integrity tag mismatch on {} byte block", expected);
            return Err(SbwtError::IntegrityError(
                "Integrity tag mismatch (wrong key or corrupted data)".into(),
            ));
        }
    }

    debug!("decompress: {} payload -> {} bytes", codec, output.len());
    Ok(output)
}

/// Split `data` into blocks and compress each under its own block key.
/// Empty input still yields one (empty) container.
///
/// Blocks are compressed in parallel; the result keeps input order.
pub fn compress_blocks(
    data: &[u8],
    key: &[u8],
    codec: CodecId,
    block_size: usize,
    tag: bool,
) -> Result<Vec<Container>> {
    validate_key(key)?;
    validate_block_size(block_size)?;

    if data.is_empty() {
        let subkey = block_key(key, 0)?;
        return Ok(vec![compress_block(data, &subkey, codec, tag)?]);
    }

    data.par_chunks(block_size)
        .enumerate()
        .map(|(i, chunk)| {
            let subkey = block_key(key, i as u64)?;
            compress_block(chunk, &subkey, codec, tag)
        })
        .collect()
}

/// Decompress an ordered sequence of containers produced by [`compress_blocks`]
pub fn decompress_blocks(containers: &[Container], key: &[u8]) -> Result<Vec<u8>> {
    validate_key(key)?;
    let blocks = containers
        .par_iter()
        .enumerate()
        .map(|(i, container)| {
            let subkey = block_key(key, i as u64)?;
            decompress(container, &subkey)
        })
        .collect::<Result<Vec<Vec<u8>>>>()?;

    Ok(blocks.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{ContainerHeader, FLAG_TAG};

    #[test]
    fn test_banana_roundtrip() {
        let container = compress(b"banana", b"k1", CodecId::Huffman).unwrap();
        assert_eq!(container.original_length(), 6);
        assert_eq!(container.codec(), CodecId::Huffman);
        assert!(container.tag.is_none());
        assert_eq!(decompress(&container, b"k1").unwrap(), b"banana");
    }

    #[test]
    fn test_wrong_key_is_silent() {
        let container = compress(b"banana", b"k1", CodecId::Huffman).unwrap();
        let output = decompress(&container, b"k9").unwrap();
        assert_eq!(output.len(), 6);
        assert_ne!(output, b"banana");
    }

    #[test]
    fn test_wrong_key_with_tag_detected() {
        let container = compress_tagged(b"banana", b"k1", CodecId::Huffman).unwrap();
        assert_eq!(container.header.flags & FLAG_TAG, FLAG_TAG);
        assert_eq!(decompress(&container, b"k1").unwrap(), b"banana");
        assert!(matches!(
            decompress(&container, b"k9"),
            Err(SbwtError::IntegrityError(_))
        ));
    }

    #[test]
    fn test_empty_input_every_codec() {
        for codec in CodecId::ALL {
            let container = compress(b"", b"key", codec).unwrap();
            assert_eq!(container.header.original_length, 0);
            assert!(decompress(&container, b"key").unwrap().is_empty());
        }
    }

    #[test]
    fn test_single_byte_every_codec() {
        for codec in CodecId::ALL {
            let container = compress(b"q", b"key", codec).unwrap();
            assert_eq!(decompress(&container, b"key").unwrap(), b"q");
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            compress(b"data", b"", CodecId::Lzw),
            Err(SbwtError::InvalidKey)
        ));
        let container = compress(b"data", b"k", CodecId::Lzw).unwrap();
        assert!(matches!(decompress(&container, b""), Err(SbwtError::InvalidKey)));
    }

    #[test]
    fn test_serialized_container_roundtrip() {
        let data = b"serialize me through the container format".repeat(10);
        for codec in CodecId::ALL {
            let bytes = compress(&data, b"wire", codec).unwrap().to_bytes();
            let container = Container::from_bytes(&bytes).unwrap();
            assert_eq!(decompress(&container, b"wire").unwrap(), data);
        }
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut container = compress(b"hello world", b"k", CodecId::Arithmetic).unwrap();
        container.header.original_length = 12;
        assert!(matches!(
            decompress(&container, b"k"),
            Err(SbwtError::CorruptPayload(_))
        ));
    }

    #[test]
    fn test_codec_byte_drives_decoding() {
        let container = compress(b"abcabcabc", b"k", CodecId::Lzw).unwrap();
        let mut bytes = container.to_bytes();
        // Relabel an LZW payload as bzip2
        bytes[5] = CodecId::Bzip2.as_u8();
        let relabeled = Container::from_bytes(&bytes).unwrap();
        assert!(decompress(&relabeled, b"k").is_err());

        bytes[5] = 42;
        assert!(matches!(
            ContainerHeader::from_bytes(&bytes),
            Err(SbwtError::UnsupportedCodec(42))
        ));
    }

    #[test]
    fn test_compress_blocks_roundtrip() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * i % 97) as u8).collect();
        for codec in CodecId::ALL {
            let containers = compress_blocks(&data, b"blocks", codec, 4096, false).unwrap();
            assert_eq!(containers.len(), 3);
            assert_eq!(containers[2].original_length(), 10_000 - 8192);
            assert_eq!(decompress_blocks(&containers, b"blocks").unwrap(), data);
        }
    }

    #[test]
    fn test_blocks_use_distinct_keys() {
        let data = b"same block".repeat(2);
        let containers = compress_blocks(&data, b"k", CodecId::Huffman, 10, false).unwrap();
        assert_eq!(containers.len(), 2);
        assert_ne!(containers[0], containers[1]);
    }

    #[test]
    fn test_compress_blocks_empty() {
        let containers = compress_blocks(b"", b"k", CodecId::Lzw, DEFAULT_BLOCK_SIZE, true).unwrap();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].original_length(), 0);
        assert!(decompress_blocks(&containers, b"k").unwrap().is_empty());
    }

    #[test]
    fn test_block_order_matters_with_tags() {
        let data = b"first block!second block".to_vec();
        let mut containers = compress_blocks(&data, b"k", CodecId::Huffman, 12, true).unwrap();
        containers.swap(0, 1);
        assert!(matches!(
            decompress_blocks(&containers, b"k"),
            Err(SbwtError::IntegrityError(_))
        ));
    }

    #[test]
    fn test_invalid_block_size() {
        assert!(matches!(
            compress_blocks(b"x", b"k", CodecId::Huffman, 0, false),
            Err(SbwtError::InvalidBlockSize(0))
        ));
        assert!(validate_block_size(MAX_BLOCK_SIZE).is_ok());
        assert!(validate_block_size(MAX_BLOCK_SIZE + 1).is_err());
        assert!(validate_block_size(1).is_ok());
    }

    #[test]
    fn test_oversized_symbol_count_rejected() {
        // Arithmetic payload claiming fifty million symbols of a one-symbol model
        let mut payload = 50_000_000u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.push(b'a');
        payload.extend_from_slice(&1u16.to_le_bytes());
        let container = Container::new(CodecId::Arithmetic, 6, 0, None, payload).unwrap();
        assert!(matches!(
            decompress(&container, b"k"),
            Err(SbwtError::CorruptPayload(_))
        ));
    }

    #[test]
    fn test_original_length_over_limit_rejected() {
        let mut container = compress(b"abc", b"k", CodecId::Bzip2).unwrap();
        container.header.original_length = (MAX_BLOCK_SIZE + 1) as u32;
        assert!(matches!(
            decompress(&container, b"k"),
            Err(SbwtError::CorruptPayload(_))
        ));
    }

    #[test]
    fn test_parallel_blocks_match_sequential() {
        let data: Vec<u8> = (0..50_000u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 24) as u8)
            .collect();
        for codec in CodecId::ALL {
            let sequential = data
                .chunks(1000)
                .enumerate()
                .map(|(i, chunk)| {
                    let subkey = block_key(b"par", i as u64)?;
                    compress_block(chunk, &subkey, codec, true)
                })
                .collect::<Result<Vec<_>>>()
                .unwrap();
            let parallel = compress_blocks(&data, b"par", codec, 1000, true).unwrap();
            assert_eq!(parallel.len(), 50);
            assert_eq!(parallel, sequential);
            assert_eq!(decompress_blocks(&parallel, b"par").unwrap(), data);
        }
    }
}
