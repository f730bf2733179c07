use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing {asset} asset at {path}: {reason}")]
    MissingAsset {
        asset: &'static str,
        path: String,
        reason: String,
    },

    #[error("Image error: {0}")]
    Image(String),

    #[error("QR encoding error: {0}")]
    QrEncoding(String),

    #[error("Invalid layout: {0}")]
    Layout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid roster: {0}")]
    InvalidRoster(String),

    /// A batch ended without a single certificate. `failed` counts rows that
    /// were attempted and failed; zero means the roster had no usable names.
    #[error("No certificates generated ({failed} rows failed)")]
    NoCertificates { failed: usize },

    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
