//! Static Huffman coder.
//!
//! Payload layout:
//! ```text
//! [symbol_count: u32 LE][tree shape, pre-order][code bits][zero padding]
//! ```
//! The tree shape is written MSB-first: `0` marks an internal node followed by
//! its left and right subtrees, `1` marks a leaf followed by its 8-bit symbol.
//! An empty input stores only the count. A block with a single distinct byte
//! gets the one-bit code `0`.

use super::bitstream::{MsbBitReader, MsbBitWriter};
use super::{read_len_prefix, EntropyCodec};
use crate::error::{Result, SbwtError};
use crate::header::CodecId;
use log::debug;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Static Huffman coding with the tree stored in the payload
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCodec;

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(u8),
    Internal(usize, usize),
}

/// Most nodes a tree over 256 symbols can hold
const MAX_NODES: usize = 2 * 256 - 1;

impl EntropyCodec for HuffmanCodec {
    fn id(&self) -> CodecId {
        CodecId::Huffman
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let count = u32::try_from(data.len()).map_err(|_| {
            SbwtError::CompressionError(format!("huffman: block of {} bytes too large", data.len()))
        })?;
        let mut writer = MsbBitWriter::with_prefix(count.to_le_bytes().to_vec());
        if data.is_empty() {
            return Ok(writer.into_vec());
        }

        let mut freqs = [0u64; 256];
        for &b in data {
            freqs[b as usize] += 1;
        }

        let (nodes, root) = build_tree(&freqs);
        write_shape(&nodes, root, &mut writer);

        let codes = assign_codes(&nodes, root);
        for &b in data {
            for &bit in &codes[b as usize] {
                writer.write_bit(bit);
            }
        }

        let out = writer.into_vec();
        debug!("huffman: {} -> {} bytes", data.len(), out.len());
        Ok(out)
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let (count, body) = read_len_prefix(payload, "huffman")?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut reader = MsbBitReader::new(body);
        let mut nodes = Vec::new();
        let mut seen = [false; 256];
        let root = read_shape(&mut reader, &mut nodes, &mut seen)?;

        // Every symbol costs at least one bit
        if count > reader.remaining() {
            return Err(SbwtError::CorruptPayload(format!(
                "huffman: {} symbols cannot fit in {} bits",
                count,
                reader.remaining()
            )));
        }

        let mut output = Vec::with_capacity(count);
        match nodes[root] {
            Node::Leaf(symbol) => {
                for _ in 0..count {
                    if reader.read_bit()? {
                        return Err(SbwtError::CorruptPayload(
                            "huffman: invalid code for single-symbol tree".into(),
                        ));
                    }
                    output.push(symbol);
                }
            }
            Node::Internal(..) => {
                for _ in 0..count {
                    let mut current = root;
                    loop {
                        match nodes[current] {
                            Node::Leaf(symbol) => {
                                output.push(symbol);
                                break;
                            }
                            Node::Internal(left, right) => {
                                current = if reader.read_bit()? { right } else { left };
                            }
                        }
                    }
                }
            }
        }

        Ok(output)
    }
}

/// Build the Huffman tree for nonzero frequencies.
///
/// Ties are broken by symbol value for leaves and by creation order for
/// internal nodes, so the tree is a pure function of the frequencies.
fn build_tree(freqs: &[u64; 256]) -> (Vec<Node>, usize) {
    let mut nodes = Vec::with_capacity(MAX_NODES);
    let mut heap = BinaryHeap::new();

    for (symbol, &freq) in freqs.iter().enumerate() {
        if freq > 0 {
            nodes.push(Node::Leaf(symbol as u8));
            heap.push(Reverse((freq, symbol, nodes.len() - 1)));
        }
    }

    let mut next_order = 256;
    while heap.len() > 1 {
        let Some(Reverse((f1, _, left))) = heap.pop() else { break };
        let Some(Reverse((f2, _, right))) = heap.pop() else { break };
        nodes.push(Node::Internal(left, right));
        heap.push(Reverse((f1 + f2, next_order, nodes.len() - 1)));
        next_order += 1;
    }

    let root = heap.pop().map(|Reverse((_, _, index))| index).unwrap_or(0);
    (nodes, root)
}

fn write_shape(nodes: &[Node], index: usize, writer: &mut MsbBitWriter) {
    match nodes[index] {
        Node::Leaf(symbol) => {
            writer.write_bit(true);
            writer.write_bits(symbol as u32, 8);
        }
        Node::Internal(left, right) => {
            writer.write_bit(false);
            write_shape(nodes, left, writer);
            write_shape(nodes, right, writer);
        }
    }
}

fn read_shape(
    reader: &mut MsbBitReader<'_>,
    nodes: &mut Vec<Node>,
    seen: &mut [bool; 256],
) -> Result<usize> {
    if nodes.len() >= MAX_NODES {
        return Err(SbwtError::CorruptPayload("huffman: tree has too many nodes".into()));
    }

    if reader.read_bit()? {
        let symbol = reader.read_bits(8)? as u8;
        if seen[symbol as usize] {
            return Err(SbwtError::CorruptPayload(format!(
                "huffman: symbol {} appears twice in tree",
                symbol
            )));
        }
        seen[symbol as usize] = true;
        nodes.push(Node::Leaf(symbol));
        Ok(nodes.len() - 1)
    } else {
        // Reserve the slot so node indices stay in pre-order
        let index = nodes.len();
        nodes.push(Node::Leaf(0));
        let left = read_shape(reader, nodes, seen)?;
        let right = read_shape(reader, nodes, seen)?;
        nodes[index] = Node::Internal(left, right);
        Ok(index)
    }
}

fn assign_codes(nodes: &[Node], root: usize) -> Vec<Vec<bool>> {
    let mut codes = vec![Vec::new(); 256];
    if let Node::Leaf(symbol) = nodes[root] {
        codes[symbol as usize] = vec![false];
        return codes;
    }

    let mut stack = vec![(root, Vec::new())];
    while let Some((index, prefix)) = stack.pop() {
        match nodes[index] {
            Node::Leaf(symbol) => codes[symbol as usize] = prefix,
            Node::Internal(left, right) => {
                let mut right_code = prefix.clone();
                right_code.push(true);
                let mut left_code = prefix;
                left_code.push(false);
                stack.push((right, right_code));
                stack.push((left, left_code));
            }
        }
    }
    codes
}
