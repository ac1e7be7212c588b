use crate::block::decompress_blocks;
use crate::cli::compress::FileReport;
use crate::container::read_archive;
use crate::error::Result;
use log::info;
use std::path::Path;

/// Options for the decompress command
#[derive(Debug, Clone, Default)]
pub struct DecompressOptions {
    pub key: Vec<u8>,
}

/// Decompress an archive back to the original file.
/// The output is only written once every block has been recovered.
pub fn decompress_file(
    input_path: &Path,
    output_path: &Path,
    options: &DecompressOptions,
) -> Result<FileReport> {
    let containers = read_archive(input_path)?;
    info!(
        "decompressing {} ({} blocks)",
        input_path.display(),
        containers.len()
    );

    let data = decompress_blocks(&containers, &options.key)?;
    std::fs::write(output_path, &data)?;

    info!("wrote {} ({} bytes)", output_path.display(), data.len());
    Ok(FileReport {
        blocks: containers.len(),
        original_bytes: data.len(),
        archive_bytes: containers.iter().map(|c| c.encoded_len()).sum(),
    })
}
