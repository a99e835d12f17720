use crate::model::ItemRecord;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse content: {0}")]
    InvalidContent(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("IO error while reading response body: {0}")]
    Io(#[from] std::io::Error),
    #[error("Fetch task failed: {0}")]
    Join(String),
}

/// Where branch archives come from.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Short identifier used in logs (e.g., "http").
    fn source_id(&self) -> &str;

    /// Downloads the whole archive at `url` into memory.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Turns one extracted item file into an [`ItemRecord`].
pub trait RecordParser: Send + Sync {
    /// Returns the format ID this parser handles (e.g., "json").
    fn format_id(&self) -> &str;

    /// Cheap check on the file name; files it rejects are skipped unread.
    fn can_handle(&self, path: &Path) -> bool;

    /// Parses raw file content into an [`ItemRecord`].
    fn parse(&self, content: &[u8]) -> Result<ItemRecord, ParseError>;
}
