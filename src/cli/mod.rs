pub mod compress;
pub mod decompress;
pub mod info;

pub use compress::*;
pub use decompress::*;
pub use info::*;

use crate::error::{Result, SbwtError};
use std::path::Path;

/// Resolve key material from a literal or a key file.
/// A key file contributes its content with surrounding whitespace trimmed.
pub fn load_key(key: Option<&str>, key_file: Option<&Path>) -> Result<Vec<u8>> {
    let key = match (key, key_file) {
        (Some(key), None) => key.as_bytes().to_vec(),
        (None, Some(path)) => std::fs::read(path)?.trim_ascii().to_vec(),
        (Some(_), Some(_)) => {
            return Err(SbwtError::InvalidFormat(
                "Provide either a key or a key file, not both".into(),
            ))
        }
        (None, None) => return Err(SbwtError::InvalidKey),
    };
    crate::pipeline::validate_key(&key)?;
    Ok(key)
}
