/// Move-to-front transform over the full byte alphabet.
/// Runs left by the block transform become runs of zeros.
pub fn mtf_encode(data: &[u8]) -> Vec<u8> {
    let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut output = Vec::with_capacity(data.len());

    for &byte in data {
        let index = table
            .iter()
            .position(|&b| b == byte)
            .unwrap_or_default();
        output.push(index as u8);
        if index != 0 {
            table.copy_within(0..index, 1);
            table[0] = byte;
        }
    }

    output
}

/// Inverse of [`mtf_encode`]
pub fn mtf_decode(data: &[u8]) -> Vec<u8> {
    let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut output = Vec::with_capacity(data.len());

    for &index in data {
        let index = index as usize;
        let byte = table[index];
        output.push(byte);
        if index != 0 {
            table.copy_within(0..index, 1);
            table[0] = byte;
        }
    }

    output
}
