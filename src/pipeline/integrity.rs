use crate::header::TAG_SIZE;
use hmac::{Hmac, Mac};
use sha3::Sha3_256;

type HmacSha3_256 = Hmac<Sha3_256>;

/// HMAC over the block length (u64 LE) followed by the block
fn block_mac(block: &[u8], key: &[u8]) -> HmacSha3_256 {
    let mut mac = HmacSha3_256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(&(block.len() as u64).to_le_bytes());
    mac.update(block);
    mac
}

/// Integrity tag over an original block, keyed by the block key
pub fn compute_tag(block: &[u8], key: &[u8]) -> [u8; TAG_SIZE] {
    block_mac(block, key).finalize().into_bytes().into()
}

/// Check a stored tag against a recovered block in constant time
pub fn verify_tag(block: &[u8], key: &[u8], tag: &[u8]) -> bool {
    block_mac(block, key).verify_slice(tag).is_ok()
}
