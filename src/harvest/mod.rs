//! Harvest module - archive download, item extraction and table building.
//!
//! This module provides the stages of the item harvester:
//! - **Fetch**: [`HttpArchiveSource`] downloads the branch archive
//! - **Extract**: [`ZipExtractor`] unpacks the item folder into a [`TempExtraction`]
//! - **Transform**: [`transform`] derives table keys and names from item records
//! - **Write**: [`writer`] persists the [`ItemTable`](crate::model::ItemTable)
//! - **Pipeline**: Async coordinator via [`pipeline::HarvestPipeline`]

pub mod archive;
pub mod fetch;
pub mod formats;
pub mod pipeline;
pub mod traits;
pub mod transform;
pub mod writer;

// Re-export commonly used types
pub use traits::{ExtractionError, WriteError};

pub use archive::ZipExtractor;
pub use fetch::HttpArchiveSource;
pub use formats::json::JsonRecordParser;
pub use pipeline::{
    Extractor, HarvestPipeline, HarvestResult, HarvestStats, PipelineError, SourceInfo,
    TempExtraction,
};
