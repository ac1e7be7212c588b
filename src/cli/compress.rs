use crate::block::{compress_blocks, DEFAULT_BLOCK_SIZE};
use crate::container::write_archive;
use crate::error::Result;
use crate::header::CodecId;
use log::info;
use std::path::{Path, PathBuf};

/// Extension appended to compressed archives
pub const ARCHIVE_EXTENSION: &str = "sbwt";

/// Options for the compress command
#[derive(Debug, Clone)]
pub struct CompressOptions {
    pub key: Vec<u8>,
    pub codec: CodecId,
    /// Archive block size in bytes (1 B to 64 MiB)
    pub block_size: usize,
    /// Store an integrity tag per block
    pub tag: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            key: Vec::new(),
            codec: CodecId::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            tag: false,
        }
    }
}

/// Outcome of a file operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileReport {
    pub blocks: usize,
    pub original_bytes: usize,
    pub archive_bytes: usize,
}

impl FileReport {
    /// Archive size relative to the original, in percent
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.archive_bytes as f64 * 100.0 / self.original_bytes as f64
    }
}

/// `INPUT` → `INPUT.sbwt`
pub fn default_output_path(input_path: &Path) -> PathBuf {
    let mut name = input_path.as_os_str().to_owned();
    name.push(".");
    name.push(ARCHIVE_EXTENSION);
    PathBuf::from(name)
}

/// Compress a file into an archive of containers
pub fn compress_file(
    input_path: &Path,
    output_path: &Path,
    options: &CompressOptions,
) -> Result<FileReport> {
    let data = std::fs::read(input_path)?;
    info!(
        "compressing {} ({} bytes) with {}, block size {}",
        input_path.display(),
        data.len(),
        options.codec,
        options.block_size
    );

    let containers = compress_blocks(
        &data,
        &options.key,
        options.codec,
        options.block_size,
        options.tag,
    )?;
    write_archive(output_path, &containers)?;

    let report = FileReport {
        blocks: containers.len(),
        original_bytes: data.len(),
        archive_bytes: containers.iter().map(|c| c.encoded_len()).sum(),
    };
    info!(
        "wrote {} ({} blocks, {} bytes)",
        output_path.display(),
        report.blocks,
        report.archive_bytes
    );
    Ok(report)
}
