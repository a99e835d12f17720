//! Item harvest pipeline executor.
//!
//! This module provides the [`HarvestPipeline`] coordinator that executes
//! sequential harvest stages (Fetch → Extract → Transform → Write → Cleanup) with:
//! - Async execution via `tokio`, blocking work on the blocking pool
//! - Optional per-stage timeouts
//! - Structured logging via `tracing`
//! - Automatic cleanup of the extraction directory via RAII (`Drop` on `TempExtraction`)

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::executor::{default_concurrency, FileOutcome, FileReport, ItemExecutor};
use crate::harvest::formats::json::JsonRecordParser;
use crate::harvest::traits::ExtractionError;
use crate::harvest::writer;
use crate::model::{ItemTable, RepoSpec};
use crate::traits::{ArchiveSource, RecordParser};

/// Where the table lands, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "data/items.json";

// ============================================================================
// Pipeline Types
// ============================================================================

/// The extracted archive root on disk.
///
/// # RAII Cleanup
///
/// `TempExtraction` implements [`Drop`] so the directory is removed on every
/// exit path once `cleanup_on_drop` is set, including early returns from
/// failing stages. It does not implement `Clone`; clone `path` instead.
///
/// # Security
///
/// Use [`TempExtraction::safe_child`] to resolve paths inside the extraction
/// directory. It rejects any path that would escape the root via `..` or
/// absolute components (path traversal guard).
#[derive(Debug)]
pub struct TempExtraction {
    /// Archive root directory, e.g. `./NotEnoughUpdates-REPO-master`
    pub path: PathBuf,

    /// Folder below `path` holding the item files
    pub folder: String,

    /// Metadata about the downloaded archive
    pub source_info: SourceInfo,

    /// Whether to delete the directory on drop (mirrors pipeline `auto_cleanup`).
    pub(crate) cleanup_on_drop: bool,
}

impl TempExtraction {
    pub fn new(
        path: PathBuf,
        folder: String,
        source_info: SourceInfo,
        cleanup_on_drop: bool,
    ) -> Self {
        Self {
            path,
            folder,
            source_info,
            cleanup_on_drop,
        }
    }

    /// Directory holding the extracted item files.
    pub fn items_dir(&self) -> PathBuf {
        self.path.join(&self.folder)
    }

    /// Resolves `relative` against the extraction root, rejecting any path
    /// that escapes the root (path traversal guard).
    ///
    /// # Errors
    ///
    /// Returns `Err` if `relative` contains `..`, is absolute, or would
    /// otherwise escape the extraction directory.
    pub fn safe_child(&self, relative: &Path) -> Result<PathBuf, ExtractionError> {
        use std::path::Component;

        let rejected = || ExtractionError::PathTraversal {
            attempted: relative.display().to_string(),
        };

        if relative.is_absolute() {
            return Err(rejected());
        }

        for component in relative.components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(rejected());
                }
                Component::CurDir | Component::Normal(_) => {}
            }
        }

        Ok(self.path.join(relative))
    }

    /// Deletes the directory now. Fails if it is already gone.
    pub fn remove(mut self) -> std::io::Result<()> {
        self.cleanup_on_drop = false;
        std::fs::remove_dir_all(&self.path)
    }

    /// Disarms cleanup and hands back the directory path.
    pub fn keep(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        self.path.clone()
    }
}

impl Drop for TempExtraction {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove extraction directory"
                );
            }
        }
    }
}

/// Downloaded archive information.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// Archive URL
    pub url: String,

    /// Archive size in bytes
    pub archive_bytes: u64,

    /// Number of files written to disk
    pub files_extracted: usize,
}

/// Complete harvest result with the table and statistics.
#[derive(Debug)]
pub struct HarvestResult {
    /// The table as written
    pub table: ItemTable,

    /// Where the table was written
    pub output_path: PathBuf,

    /// Path to extracted contents.
    ///
    /// `None` when `auto_cleanup` is enabled, the directory is gone by then.
    pub extraction_path: Option<PathBuf>,

    /// Performance and processing statistics
    pub stats: HarvestStats,
}

/// Statistics about the harvest operation.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    /// Total time spent on the entire harvest (milliseconds)
    pub total_duration_ms: u64,

    /// Time spent downloading the archive (milliseconds)
    pub fetch_duration_ms: u64,

    /// Time spent on extraction stage (milliseconds)
    pub extraction_duration_ms: u64,

    /// Time spent parsing item files (milliseconds)
    pub transform_duration_ms: u64,

    /// Downloaded archive size (bytes)
    pub archive_bytes: u64,

    /// Files written by the extractor
    pub files_extracted: usize,

    /// Entries listed in the item folder
    pub files_seen: usize,

    /// Entries that are not item files
    pub skipped: usize,

    /// Item files that could not be read or decoded
    pub decode_failures: usize,

    /// Item files without an identifier
    pub discarded: usize,

    /// Entries that replaced an earlier one with the same identifier
    pub duplicate_keys: usize,

    /// Entries in the written table
    pub entries_written: usize,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Fatal errors; any of them aborts the run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Stage execution exceeded timeout
    #[error("Stage '{stage}' timed out after {timeout_ms}ms")]
    StageTimeout { stage: String, timeout_ms: u64 },

    /// Archive download failed
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// Extraction stage failed
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// The archive had no item folder
    #[error("Items folder '{path}' is not readable: {source}")]
    MissingItemsFolder {
        path: String,
        source: std::io::Error,
    },

    /// Worker pool failure
    #[error("Transform failed: {0}")]
    TransformFailed(String),

    /// Output file could not be written
    #[error("Writing '{path}' failed: {reason}")]
    WriteFailed { path: String, reason: String },

    /// Extraction directory could not be removed
    #[error("Removing '{path}' failed: {source}")]
    CleanupFailed {
        path: String,
        source: std::io::Error,
    },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Trait for extraction stage implementations.
///
/// Extractors take the downloaded archive and produce a [`TempExtraction`]
/// containing the repository's item folder.
pub trait Extractor: Send + Sync {
    /// Unpacks `repo`'s item folder from `archive` below `dest`.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is not an archive or writing fails.
    fn execute(
        &self,
        archive: Vec<u8>,
        repo: &RepoSpec,
        dest: &Path,
        cleanup_on_drop: bool,
    ) -> Result<TempExtraction, ExtractionError>;

    /// Returns the name of this extractor stage.
    fn stage_name(&self) -> &'static str;
}

/// Item harvest pipeline.
///
/// Stages run strictly in order:
/// 1. **Fetch**: download the branch archive into memory
/// 2. **Extract**: unpack the item folder into the working directory
/// 3. **Transform**: parse every item file in parallel and build the table
/// 4. **Write**: persist the table
/// 5. **Cleanup**: remove the extracted directory
///
/// # Example
///
/// ```ignore
/// use item_harvester::harvest::{HarvestPipeline, HttpArchiveSource, ZipExtractor};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = HarvestPipeline::new(HttpArchiveSource::new(), ZipExtractor);
///     let result = pipeline.execute().await?;
///     println!("Wrote {} items", result.table.len());
///     Ok(())
/// }
/// ```
pub struct HarvestPipeline<S, E>
where
    S: ArchiveSource,
    E: Extractor,
{
    /// Archive download implementation
    source: S,

    /// Extraction stage implementation
    extractor: Arc<E>,

    /// Item file parser
    parser: Arc<dyn RecordParser>,

    /// Repository to harvest
    repo: RepoSpec,

    /// Directory the archive is extracted into and the output is relative to
    workdir: PathBuf,

    /// Output file (default: `data/items.json`)
    output_path: PathBuf,

    /// Worker pool size for the transform stage
    concurrency: usize,

    /// Timeout for each stage (default: none)
    stage_timeout: Option<Duration>,

    /// Whether to automatically remove the extraction directory
    auto_cleanup: bool,
}

impl<S, E> HarvestPipeline<S, E>
where
    S: ArchiveSource,
    E: Extractor + 'static,
{
    /// Creates a new pipeline with the given source and extractor.
    ///
    /// Default configuration:
    /// - Repository: [`RepoSpec::default`]
    /// - Working directory: `.`, output: [`DEFAULT_OUTPUT`]
    /// - Parser: [`JsonRecordParser`]
    /// - Concurrency: [`default_concurrency`]
    /// - Timeout: none
    /// - Auto-cleanup: enabled
    pub fn new(source: S, extractor: E) -> Self {
        Self {
            source,
            extractor: Arc::new(extractor),
            parser: Arc::new(JsonRecordParser),
            repo: RepoSpec::default(),
            workdir: PathBuf::from("."),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            concurrency: default_concurrency(),
            stage_timeout: None,
            auto_cleanup: true,
        }
    }

    pub fn with_repo(mut self, repo: RepoSpec) -> Self {
        self.repo = repo;
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Sets the output file. Relative paths resolve against the working directory.
    pub fn with_output(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn RecordParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the timeout for each pipeline stage.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    /// Configures automatic cleanup of the extraction directory.
    ///
    /// # Arguments
    ///
    /// * `cleanup` - If `true`, the directory is deleted after the table is written
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.auto_cleanup = cleanup;
        self
    }

    pub fn repo(&self) -> &RepoSpec {
        &self.repo
    }

    /// Executes the complete harvest.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if:
    /// - The download or extraction fails
    /// - The archive has no item folder
    /// - The output file cannot be written (missing parent directory included)
    /// - The extraction directory cannot be removed
    /// - A stage times out
    ///
    /// Undecodable item files are not errors; they are logged and counted in
    /// [`HarvestStats::decode_failures`].
    pub async fn execute(&self) -> Result<HarvestResult, PipelineError> {
        let start = Instant::now();
        let mut stats = HarvestStats::default();

        // ====================================================================
        // Stage 1: Fetch
        // ====================================================================

        let url = self.repo.archive_url();
        info!(
            repo = %self.repo.coordinate(),
            source = self.source.source_id(),
            %url,
            "Downloading {}...",
            self.repo.name
        );
        let fetch_start = Instant::now();

        let archive = self
            .run_stage("fetch", self.source.fetch(&url))
            .await?
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;

        stats.archive_bytes = archive.len() as u64;
        stats.fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;
        info!(
            bytes = stats.archive_bytes,
            duration_ms = stats.fetch_duration_ms,
            "Archive downloaded"
        );

        // ====================================================================
        // Stage 2: Extraction
        // ====================================================================
        //
        // From here on `temp` owns the directory; any `?` below drops it and
        // Drop removes the directory when auto_cleanup is set.

        info!("Extracting...");
        let extraction_start = Instant::now();

        let extractor = Arc::clone(&self.extractor);
        let repo = self.repo.clone();
        let dest = self.workdir.clone();
        let auto_cleanup = self.auto_cleanup;

        let temp = self
            .run_stage(
                self.extractor.stage_name(),
                tokio::task::spawn_blocking(move || {
                    extractor.execute(archive, &repo, &dest, auto_cleanup)
                }),
            )
            .await?
            .map_err(|e| PipelineError::ExtractionFailed(format!("Task join error: {}", e)))?
            .map_err(|e| PipelineError::ExtractionFailed(e.to_string()))?;

        stats.files_extracted = temp.source_info.files_extracted;
        stats.extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
        info!(
            files = stats.files_extracted,
            duration_ms = stats.extraction_duration_ms,
            path = %temp.items_dir().display(),
            "Item files extracted"
        );

        // ====================================================================
        // Stage 3: Transform
        // ====================================================================

        let transform_start = Instant::now();
        let files = list_item_files(&temp.items_dir())?;
        stats.files_seen = files.len();

        let executor = ItemExecutor::new(self.concurrency);
        let reports = self
            .run_stage(
                "transform",
                executor.execute(Arc::clone(&self.parser), files),
            )
            .await?
            .map_err(|e| PipelineError::TransformFailed(e.to_string()))?;

        let table = merge_reports(reports, &mut stats);
        stats.transform_duration_ms = transform_start.elapsed().as_millis() as u64;
        info!(
            entries = table.len(),
            skipped = stats.skipped,
            decode_failures = stats.decode_failures,
            discarded = stats.discarded,
            duration_ms = stats.transform_duration_ms,
            "Item table built"
        );

        // ====================================================================
        // Stage 4: Write
        // ====================================================================

        let output_path = self.workdir.join(&self.output_path);
        let bytes = writer::write_table(&table, &output_path).map_err(|e| {
            PipelineError::WriteFailed {
                path: output_path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        stats.entries_written = table.len();
        info!(
            path = %output_path.display(),
            entries = stats.entries_written,
            bytes,
            "Success: item table updated"
        );

        // ====================================================================
        // Stage 5: Cleanup
        // ====================================================================

        let extraction_path = if self.auto_cleanup {
            let path = temp.path.clone();
            temp.remove().map_err(|e| PipelineError::CleanupFailed {
                path: path.display().to_string(),
                source: e,
            })?;
            info!(path = %path.display(), "Success: extraction directory removed");
            None
        } else {
            Some(temp.keep())
        };

        stats.total_duration_ms = start.elapsed().as_millis() as u64;

        Ok(HarvestResult {
            table,
            output_path,
            extraction_path,
            stats,
        })
    }

    /// Awaits `fut`, bounded by the stage timeout when one is set.
    async fn run_stage<F, T>(&self, stage: &str, fut: F) -> Result<T, PipelineError>
    where
        F: Future<Output = T>,
    {
        match self.stage_timeout {
            Some(limit) => timeout(limit, fut)
                .await
                .map_err(|_| PipelineError::StageTimeout {
                    stage: stage.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                }),
            None => Ok(fut.await),
        }
    }
}

/// Lists the item folder (non-recursive).
fn list_item_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::MissingItemsFolder {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        files.push(entry?.path());
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Folds worker reports into the table.
///
/// Reports are merged in path order so a duplicate identifier always resolves
/// to the same file.
fn merge_reports(mut reports: Vec<FileReport>, stats: &mut HarvestStats) -> ItemTable {
    reports.sort_by(|a, b| a.path.cmp(&b.path));

    let mut table = ItemTable::new();
    for report in reports {
        match report.outcome {
            FileOutcome::Entry { id, entry } => {
                if let Some(previous) = table.insert(id.clone(), entry) {
                    stats.duplicate_keys += 1;
                    warn!(
                        %id,
                        file = %file_name(&report.path),
                        replaced = %previous.plain_name(),
                        "Duplicate item identifier, keeping the later file"
                    );
                }
            }
            FileOutcome::Discarded => stats.discarded += 1,
            FileOutcome::Skipped => stats.skipped += 1,
            FileOutcome::Failed(e) => {
                stats.decode_failures += 1;
                warn!(
                    file = %file_name(&report.path),
                    error = %e,
                    "Error decoding or opening JSON in file"
                );
            }
        }
    }
    table
}

// ============================================================================
// Tests
// ============================================================================
