use thiserror::Error;

#[derive(Error, Debug)]
pub enum SbwtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid key: the key must contain at least one byte")]
    InvalidKey,

    #[error("Unsupported codec id: {0}")]
    UnsupportedCodec(u8),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    #[error("Invalid block size: {0}. Must be between 1 byte and 64 MiB")]
    InvalidBlockSize(usize),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Data integrity error: {0}")]
    IntegrityError(String),
}

pub type Result<T> = std::result::Result<T, SbwtError>;
