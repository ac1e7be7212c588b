use crate::container::{read_archive, Container};
use crate::error::Result;
use crate::header::CodecId;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Per-block metadata, readable without the key
#[derive(Debug, Clone, Serialize)]
pub struct BlockInfo {
    pub index: usize,
    pub codec: CodecId,
    pub original_length: usize,
    pub payload_length: usize,
    /// Hex-encoded integrity tag, when present
    pub tag: Option<String>,
}

impl BlockInfo {
    fn from_container(index: usize, container: &Container) -> Self {
        Self {
            index,
            codec: container.codec(),
            original_length: container.original_length(),
            payload_length: container.payload.len(),
            tag: container.tag.as_ref().map(hex::encode),
        }
    }

    /// Payload size relative to the original block, in percent
    pub fn ratio(&self) -> f64 {
        if self.original_length == 0 {
            return 0.0;
        }
        self.payload_length as f64 * 100.0 / self.original_length as f64
    }
}

/// Archive-level summary
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    pub file: String,
    pub file_size: u64,
    pub total_original: usize,
    pub blocks: Vec<BlockInfo>,
}

/// Collect metadata for every container in an archive
pub fn archive_info(path: &Path) -> Result<ArchiveInfo> {
    let containers = read_archive(path)?;
    let blocks: Vec<BlockInfo> = containers
        .iter()
        .enumerate()
        .map(|(i, c)| BlockInfo::from_container(i, c))
        .collect();

    Ok(ArchiveInfo {
        file: path.display().to_string(),
        file_size: fs::metadata(path)?.len(),
        total_original: blocks.iter().map(|b| b.original_length).sum(),
        blocks,
    })
}

/// Display information about an archive
pub fn show_info(path: &Path) -> Result<String> {
    let info = archive_info(path)?;

    let mut output = String::new();
    output.push_str("SBWT Archive Information\n");
    output.push_str("========================\n\n");

    output.push_str(&format!("File: {}\n", info.file));
    output.push_str(&format!("Archive size: {}\n", format_size(info.file_size)));
    output.push_str(&format!("Original size: {}\n", format_size(info.total_original as u64)));
    output.push_str(&format!("Blocks: {}\n", info.blocks.len()));
    if info.total_original > 0 {
        output.push_str(&format!(
            "Ratio: {:.1}%\n",
            info.file_size as f64 * 100.0 / info.total_original as f64
        ));
    }
    output.push('\n');

    output.push_str("  #  codec       original    payload   ratio  tag\n");
    for block in &info.blocks {
        output.push_str(&format!(
            "{:>3}  {:<10} {:>9} {:>10} {:>6.1}%  {}\n",
            block.index,
            block.codec,
            block.original_length,
            block.payload_length,
            block.ratio(),
            block.tag.as_deref().map(|t| &t[..16]).unwrap_or("-"),
        ));
    }

    Ok(output)
}

/// Archive information as pretty-printed JSON
pub fn show_info_json(path: &Path) -> Result<String> {
    let info = archive_info(path)?;
    Ok(serde_json::to_string_pretty(&info)?)
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
