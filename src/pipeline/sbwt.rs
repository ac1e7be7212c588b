//! Keyed Burrows-Wheeler block transform.
//!
//! The rotations of a block are ordered by a key-derived comparator instead
//! of plain byte order: every byte is replaced by its keyed rank (see
//! [`keyschedule::alphabet`]) and the ranked rotations are sorted. The last
//! column of that ordering is emitted in rank space, so both the ordering
//! and the symbol values depend on the key. The row of the original rotation
//! is stored through the keyed permutation over `0..n` instead of in the
//! clear.

use crate::error::{Result, SbwtError};
use crate::pipeline::keyschedule::{self, Permutation};
use log::debug;

const ALPHABET_SIZE: usize = 256;

/// Output of the forward transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedBlock {
    /// Last column of the keyed rotation ordering (same length as the input)
    pub data: Vec<u8>,
    /// Obscured row index of the original rotation
    pub primary_index: usize,
}

impl TransformedBlock {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Forward transform of `block` under `key`
pub fn forward(block: &[u8], key: &[u8]) -> Result<TransformedBlock> {
    keyschedule::validate_key(key)?;
    let n = block.len();
    if n <= 1 {
        return Ok(TransformedBlock {
            data: block.to_vec(),
            primary_index: 0,
        });
    }

    let ranks = keyschedule::alphabet(key)?;
    let ranked: Vec<u8> = block.iter().map(|&b| ranks[b as usize]).collect();

    let order = sort_rotations(&ranked);
    let mut data = Vec::with_capacity(n);
    let mut primary = 0;
    for (row, &start) in order.iter().enumerate() {
        if start == 0 {
            primary = row;
        }
        data.push(ranked[(start + n - 1) % n]);
    }

    let primary_index = keyschedule::derive(key, n)?.get(primary);
    debug!("sbwt forward: {} bytes", n);

    Ok(TransformedBlock {
        data,
        primary_index,
    })
}

/// Inverse transform. A key different from the forward key is not detected
/// and yields unrelated bytes.
pub fn inverse(transformed: &TransformedBlock, key: &[u8]) -> Result<Vec<u8>> {
    keyschedule::validate_key(key)?;
    let n = transformed.data.len();
    if n <= 1 {
        return Ok(transformed.data.clone());
    }
    if transformed.primary_index >= n {
        return Err(SbwtError::CorruptPayload(format!(
            "primary index {} out of range for {} bytes",
            transformed.primary_index, n
        )));
    }

    let index_permutation: Permutation = keyschedule::derive(key, n)?;
    let primary = index_permutation.invert().get(transformed.primary_index);

    let last = &transformed.data;
    let lf = lf_mapping(last);

    let mut ranked = vec![0u8; n];
    let mut row = primary;
    for slot in ranked.iter_mut().rev() {
        *slot = last[row];
        row = lf[row];
    }

    let symbols = keyschedule::invert_alphabet(&keyschedule::alphabet(key)?);
    debug!("sbwt inverse: {} bytes", n);
    Ok(ranked.into_iter().map(|r| symbols[r as usize]).collect())
}

/// LF mapping of a last column: row `i` maps to the row of the rotation
/// starting one position earlier.
fn lf_mapping(last: &[u8]) -> Vec<usize> {
    let mut counts = [0usize; ALPHABET_SIZE];
    for &b in last {
        counts[b as usize] += 1;
    }

    let mut starts = [0usize; ALPHABET_SIZE];
    let mut total = 0;
    for (symbol, &count) in counts.iter().enumerate() {
        starts[symbol] = total;
        total += count;
    }

    last.iter()
        .map(|&b| {
            let row = starts[b as usize];
            starts[b as usize] += 1;
            row
        })
        .collect()
}

/// Sort the cyclic rotations of `s`, returning rotation start offsets in order.
///
/// Prefix doubling with counting sort: after round `h` rotations are ranked
/// by their first `2^h` symbols. O(n log n).
fn sort_rotations(s: &[u8]) -> Vec<usize> {
    let n = s.len();
    let mut order = vec![0usize; n];
    let mut class = vec![0usize; n];
    let mut counts = vec![0usize; ALPHABET_SIZE.max(n)];

    for &b in s {
        counts[b as usize] += 1;
    }
    for i in 1..ALPHABET_SIZE {
        counts[i] += counts[i - 1];
    }
    for (i, &b) in s.iter().enumerate().rev() {
        counts[b as usize] -= 1;
        order[counts[b as usize]] = i;
    }

    let mut classes = 1;
    class[order[0]] = 0;
    for i in 1..n {
        if s[order[i]] != s[order[i - 1]] {
            classes += 1;
        }
        class[order[i]] = classes - 1;
    }

    let mut shifted = vec![0usize; n];
    let mut next_class = vec![0usize; n];
    let mut len = 1;
    while len < n && classes < n {
        // Order by second half is the current order shifted back by `len`
        for (slot, &start) in shifted.iter_mut().zip(order.iter()) {
            *slot = (start + n - len) % n;
        }

        counts[..classes].iter_mut().for_each(|c| *c = 0);
        for &start in &shifted {
            counts[class[start]] += 1;
        }
        for i in 1..classes {
            counts[i] += counts[i - 1];
        }
        for &start in shifted.iter().rev() {
            let c = class[start];
            counts[c] -= 1;
            order[counts[c]] = start;
        }

        classes = 1;
        next_class[order[0]] = 0;
        for i in 1..n {
            let current = (class[order[i]], class[(order[i] + len) % n]);
            let previous = (class[order[i - 1]], class[(order[i - 1] + len) % n]);
            if current != previous {
                classes += 1;
            }
            next_class[order[i]] = classes - 1;
        }
        std::mem::swap(&mut class, &mut next_class);
        len <<= 1;
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_last_column(s: &[u8]) -> Vec<u8> {
        let n = s.len();
        let mut rotations: Vec<Vec<u8>> = (0..n)
            .map(|i| s[i..].iter().chain(s[..i].iter()).copied().collect())
            .collect();
        rotations.sort();
        rotations.iter().map(|r| r[n - 1]).collect()
    }

    #[test]
    fn test_banana_roundtrip() {
        let transformed = forward(b"banana", b"k1").unwrap();
        assert_eq!(transformed.len(), 6);
        let restored = inverse(&transformed, b"k1").unwrap();
        assert_eq!(restored, b"banana");
    }

    #[test]
    fn test_wrong_key_yields_different_bytes() {
        let transformed = forward(b"banana", b"k1").unwrap();
        let restored = inverse(&transformed, b"k9").unwrap();
        assert_eq!(restored.len(), 6);
        assert_ne!(restored, b"banana");
    }

    #[test]
    fn test_empty_block() {
        let transformed = forward(b"", b"key").unwrap();
        assert!(transformed.is_empty());
        assert_eq!(transformed.primary_index, 0);
        assert!(inverse(&transformed, b"key").unwrap().is_empty());
    }

    #[test]
    fn test_single_byte_is_identity() {
        let transformed = forward(b"x", b"key").unwrap();
        assert_eq!(transformed.data, b"x");
        assert_eq!(transformed.primary_index, 0);
        assert_eq!(inverse(&transformed, b"key").unwrap(), b"x");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(forward(b"abc", b""), Err(SbwtError::InvalidKey)));
        let transformed = forward(b"abc", b"k").unwrap();
        assert!(matches!(inverse(&transformed, b""), Err(SbwtError::InvalidKey)));
    }

    #[test]
    fn test_periodic_and_uniform_blocks() {
        for block in [
            b"abababababab".to_vec(),
            vec![7u8; 500],
            b"aaaaaaaab".to_vec(),
            b"abcabcabcabc".to_vec(),
        ] {
            let transformed = forward(&block, b"periodic").unwrap();
            assert_eq!(inverse(&transformed, b"periodic").unwrap(), block);
        }
    }

    #[test]
    fn test_full_alphabet_roundtrip() {
        let block: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
        let transformed = forward(&block, b"alphabet").unwrap();
        assert_eq!(inverse(&transformed, b"alphabet").unwrap(), block);
    }

    #[test]
    fn test_large_block_roundtrip() {
        let block: Vec<u8> = (0..200_000u32)
            .map(|i| (i.wrapping_mul(2654435761) >> 13) as u8 % 17)
            .collect();
        let transformed = forward(&block, b"large").unwrap();
        assert_eq!(inverse(&transformed, b"large").unwrap(), block);
    }

    #[test]
    fn test_sort_matches_naive_rotations() {
        let inputs: [&[u8]; 5] = [b"banana", b"mississippi", b"abracadabra", b"zzzzyzzzz", b"ab"];
        for s in inputs {
            let order = sort_rotations(s);
            let n = s.len();
            let last: Vec<u8> = order.iter().map(|&i| s[(i + n - 1) % n]).collect();
            assert_eq!(last, naive_last_column(s));
        }
    }

    #[test]
    fn test_transform_groups_runs() {
        // Repetitive text should produce long runs in the last column
        let block = b"the cat sat on the mat and the cat sat on the hat ".repeat(20);
        let transformed = forward(&block, b"runs").unwrap();
        let runs = |d: &[u8]| d.windows(2).filter(|w| w[0] != w[1]).count();
        assert!(runs(&transformed.data) < runs(&block));
    }

    #[test]
    fn test_primary_index_in_range() {
        let transformed = forward(b"hello world", b"index").unwrap();
        assert!(transformed.primary_index < 11);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let mut transformed = forward(b"hello world", b"index").unwrap();
        transformed.primary_index = 11;
        assert!(matches!(
            inverse(&transformed, b"index"),
            Err(SbwtError::CorruptPayload(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(block in proptest::collection::vec(any::<u8>(), 0..512),
                          key in proptest::collection::vec(any::<u8>(), 1..32)) {
            let transformed = forward(&block, &key).unwrap();
            prop_assert_eq!(transformed.len(), block.len());
            prop_assert_eq!(inverse(&transformed, &key).unwrap(), block);
        }

        #[test]
        fn prop_sort_matches_naive(block in proptest::collection::vec(0u8..4, 1..64)) {
            let order = sort_rotations(&block);
            let n = block.len();
            let last: Vec<u8> = order.iter().map(|&i| block[(i + n - 1) % n]).collect();
            prop_assert_eq!(last, naive_last_column(&block));
        }

        #[test]
        fn prop_key_sensitivity(k1 in proptest::collection::vec(any::<u8>(), 1..32),
                                k2 in proptest::collection::vec(any::<u8>(), 1..32)) {
            prop_assume!(k1 != k2);
            let block = b"the quick brown fox jumps over the lazy dog";
            let t1 = forward(block, &k1).unwrap();
            let t2 = forward(block, &k2).unwrap();
            prop_assert_ne!(t1, t2);
        }
    }
}
