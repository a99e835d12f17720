//! Stage error types for the harvest pipeline.

use thiserror::Error;

/// Errors that can occur while unpacking the branch archive.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Failed to create, write or clear the extraction directory
    #[error("Extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload is not a readable zip archive
    #[error("Corrupted archive: {0}")]
    CorruptedArchive(String),

    /// An archive entry would escape the extraction root
    #[error("Path traversal attempt rejected: '{attempted}'")]
    PathTraversal { attempted: String },
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => ExtractionError::Io(io),
            other => ExtractionError::CorruptedArchive(other.to_string()),
        }
    }
}

/// Errors that can occur while persisting the item table.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Output file could not be created or written
    #[error("I/O error writing table: {0}")]
    Io(#[from] std::io::Error),

    /// Table could not be serialized
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
