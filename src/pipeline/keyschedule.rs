use crate::error::{Result, SbwtError};
use rand::rngs::StdRng;
use rand::{seq::SliceRandom, SeedableRng};
use sha3::{Digest, Sha3_256};

const PERMUTATION_DOMAIN: &[u8] = b"sbwt_keyschedule_permutation_v1";
const ALPHABET_DOMAIN: &[u8] = b"sbwt_keyschedule_alphabet_v1";
const BLOCK_KEY_DOMAIN: &[u8] = b"sbwt_keyschedule_block_key_v1";

/// A bijection over `0..n`.
///
/// `self[i]` is the position index `i` is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Identity permutation over `0..n`
    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    /// Build from an explicit mapping, checking that it is a bijection
    pub fn from_vec(mapping: Vec<usize>) -> Option<Self> {
        let n = mapping.len();
        let mut seen = vec![false; n];
        for &target in &mapping {
            if target >= n || seen[target] {
                return None;
            }
            seen[target] = true;
        }
        Some(Self(mapping))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Image of `index`
    pub fn get(&self, index: usize) -> usize {
        self.0[index]
    }

    /// Inverse mapping: entry `i` is the position of `i` in `self`
    pub fn invert(&self) -> Permutation {
        let mut inverse = vec![0usize; self.0.len()];
        for (pos, &target) in self.0.iter().enumerate() {
            inverse[target] = pos;
        }
        Permutation(inverse)
    }

    /// `self` after `other`: `(self ∘ other)[i] = self[other[i]]`
    pub fn compose(&self, other: &Permutation) -> Permutation {
        assert_eq!(self.len(), other.len());
        Permutation(other.0.iter().map(|&i| self.0[i]).collect())
    }
}

/// Derive the keyed permutation over `0..n`.
/// SHA3-256 over (domain, key, n) seeds the RNG driving a Fisher-Yates shuffle.
pub fn derive(key: &[u8], n: usize) -> Result<Permutation> {
    derive_in_domain(PERMUTATION_DOMAIN, key, n)
}

/// Inverse of a permutation produced by [`derive`]
pub fn invert(permutation: &Permutation) -> Permutation {
    permutation.invert()
}

/// Keyed byte ordering: `alphabet[b]` is the keyed rank of byte value `b`
pub fn alphabet(key: &[u8]) -> Result<[u8; 256]> {
    let permutation = derive_in_domain(ALPHABET_DOMAIN, key, 256)?;
    let mut ranks = [0u8; 256];
    for (byte, &rank) in permutation.as_slice().iter().enumerate() {
        ranks[byte] = rank as u8;
    }
    Ok(ranks)
}

/// Inverse of [`alphabet`]: `symbols[r]` is the byte holding rank `r`
pub fn invert_alphabet(ranks: &[u8; 256]) -> [u8; 256] {
    let mut symbols = [0u8; 256];
    for (byte, &rank) in ranks.iter().enumerate() {
        symbols[rank as usize] = byte as u8;
    }
    symbols
}

/// Subkey for block `block_number` of a multi-block archive
pub fn block_key(key: &[u8], block_number: u64) -> Result<Vec<u8>> {
    validate_key(key)?;
    let mut hasher = Sha3_256::new();
    hasher.update(BLOCK_KEY_DOMAIN);
    hasher.update((key.len() as u64).to_le_bytes());
    hasher.update(key);
    hasher.update(block_number.to_le_bytes());
    Ok(hasher.finalize().to_vec())
}

/// Reject structurally invalid keys
pub fn validate_key(key: &[u8]) -> Result<()> {
    if key.is_empty() {
        return Err(SbwtError::InvalidKey);
    }
    Ok(())
}

fn derive_in_domain(domain: &[u8], key: &[u8], n: usize) -> Result<Permutation> {
    validate_key(key)?;

    let seed = compute_seed(domain, key, n);
    let mut rng = StdRng::from_seed(seed);
    let mut mapping: Vec<usize> = (0..n).collect();
    mapping.shuffle(&mut rng);

    Ok(Permutation(mapping))
}

/// Compute a 32-byte seed from the key and permutation size
fn compute_seed(domain: &[u8], key: &[u8], n: usize) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(domain);
    hasher.update((key.len() as u64).to_le_bytes());
    hasher.update(key);
    hasher.update((n as u64).to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_bijection() {
        let perm = derive(b"secret", 100).unwrap();
        assert_eq!(perm.len(), 100);
        assert!(Permutation::from_vec(perm.as_slice().to_vec()).is_some());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let perm1 = derive(b"secret", 64).unwrap();
        let perm2 = derive(b"secret", 64).unwrap();
        assert_eq!(perm1, perm2);
    }

    #[test]
    fn test_derive_varies_by_key() {
        let perm1 = derive(b"secret1", 64).unwrap();
        let perm2 = derive(b"secret2", 64).unwrap();
        assert_ne!(perm1, perm2);
    }

    #[test]
    fn test_derive_empty_key() {
        assert!(matches!(derive(b"", 8), Err(SbwtError::InvalidKey)));
        assert!(matches!(alphabet(b""), Err(SbwtError::InvalidKey)));
        assert!(matches!(block_key(b"", 0), Err(SbwtError::InvalidKey)));
    }

    #[test]
    fn test_derive_small_sizes() {
        assert!(derive(b"k", 0).unwrap().is_empty());
        assert_eq!(derive(b"k", 1).unwrap().as_slice(), &[0]);
    }

    #[test]
    fn test_invert_composes_to_identity() {
        for n in [0, 1, 2, 7, 256, 1000] {
            let perm = derive(b"roundtrip", n).unwrap();
            let inverse = invert(&perm);
            assert_eq!(inverse.compose(&perm), Permutation::identity(n));
            assert_eq!(perm.compose(&inverse), Permutation::identity(n));
        }
    }

    #[test]
    fn test_invert_known_values() {
        let perm = Permutation::from_vec(vec![2, 0, 1]).unwrap();
        assert_eq!(perm.invert().as_slice(), &[1, 2, 0]);
    }

    #[test]
    fn test_from_vec_rejects_non_bijection() {
        assert!(Permutation::from_vec(vec![0, 0]).is_none());
        assert!(Permutation::from_vec(vec![0, 2]).is_none());
    }

    #[test]
    fn test_alphabet_is_bijection() {
        let ranks = alphabet(b"alphabet").unwrap();
        let symbols = invert_alphabet(&ranks);
        for byte in 0..=255u8 {
            assert_eq!(symbols[ranks[byte as usize] as usize], byte);
        }
    }

    #[test]
    fn test_alphabet_separated_from_permutation() {
        // Same key and size, different domain
        let ranks = alphabet(b"key").unwrap();
        let perm = derive(b"key", 256).unwrap();
        let as_usize: Vec<usize> = ranks.iter().map(|&r| r as usize).collect();
        assert_ne!(as_usize, perm.as_slice());
    }

    #[test]
    fn test_block_keys_differ() {
        let k0 = block_key(b"master", 0).unwrap();
        let k1 = block_key(b"master", 1).unwrap();
        assert_eq!(k0.len(), 32);
        assert_ne!(k0, k1);
        assert_eq!(k0, block_key(b"master", 0).unwrap());
    }
}
