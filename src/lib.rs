//! SBWT - Keyed Burrows-Wheeler block compressor
//!
//! A block-sorting compressor whose rotation ordering is driven by a secret
//! key. The same key is required to invert the transform; without it the
//! decoder still runs but yields unrelated bytes (unless an integrity tag was
//! stored, in which case the mismatch is reported).
//!
//! ## Pipeline
//!
//! Each block goes through the following stages:
//!
//! ```text
//! Input → SBWT (keyed) → MTF → Entropy coder → Container
//! ```
//!
//! - **SBWT**: rotations sorted under a key-derived byte order, primary index
//!   stored through a key-derived permutation
//! - **MTF**: move-to-front over the byte alphabet
//! - **Entropy coder**: huffman (default), arithmetic, lzw, or bzip2
//! - **Container**: fixed 20-byte header, optional HMAC-SHA3-256 tag, payload
//!
//! Files are split into blocks (64 KiB by default), each compressed under
//! its own block key; an archive is the concatenation of their containers.
//!
//! ## Example
//!
//! ```
//! use sbwt::{compress, decompress, CodecId};
//!
//! let container = compress(b"banana", b"k1", CodecId::Huffman).unwrap();
//! assert_eq!(decompress(&container, b"k1").unwrap(), b"banana");
//!
//! // A wrong key is not detected without a tag
//! let garbage = decompress(&container, b"k9").unwrap();
//! assert_eq!(garbage.len(), 6);
//! ```

pub mod block;
pub mod cli;
pub mod codec;
pub mod container;
pub mod error;
pub mod header;
pub mod pipeline;

pub use block::{compress, compress_blocks, compress_tagged, decompress, decompress_blocks};
pub use codec::{codec_for, EntropyCodec};
pub use container::{parse_archive, read_archive, write_archive, Container};
pub use error::{Result, SbwtError};
pub use header::{CodecId, ContainerHeader};
