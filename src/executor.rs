use crate::harvest::transform;
use crate::model::ItemEntry;
use crate::traits::{ParseError, RecordParser};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

/// Smallest worker pool the executor is sized to.
pub const MIN_WORKERS: usize = 4;

/// One worker per available processing unit, never fewer than [`MIN_WORKERS`].
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .max(MIN_WORKERS)
}

/// What a single item file contributed to the table.
#[derive(Debug)]
pub enum FileOutcome {
    /// A table entry under its final identifier
    Entry { id: String, entry: ItemEntry },
    /// Parsed fine but has no identifier
    Discarded,
    /// Not a data file
    Skipped,
    /// Unreadable or undecodable
    Failed(ParseError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Runs one file through the parser and the naming rules.
pub fn process_file<P>(parser: &P, path: &Path) -> FileOutcome
where
    P: RecordParser + ?Sized,
{
    if !parser.can_handle(path) {
        return FileOutcome::Skipped;
    }

    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) => return FileOutcome::Failed(e.into()),
    };

    match parser.parse(&content) {
        Ok(record) => match transform::derive_entry(&record) {
            Some((id, entry)) => FileOutcome::Entry { id, entry },
            None => FileOutcome::Discarded,
        },
        Err(e) => FileOutcome::Failed(e),
    }
}

pub struct ItemExecutor {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl ItemExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let limit = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Processes every file on the blocking pool, at most `limit` at a time.
    ///
    /// Reports come back in completion order.
    #[instrument(skip(self, parser, files), fields(file_count = files.len(), workers = self.limit))]
    pub async fn execute<P>(
        &self,
        parser: Arc<P>,
        files: Vec<PathBuf>,
    ) -> Result<Vec<FileReport>, ParseError>
    where
        P: RecordParser + ?Sized + 'static,
    {
        let mut tasks = JoinSet::new();

        for path in files {
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|e| ParseError::Unknown(format!("Semaphore error: {}", e)))?;
            let parser = Arc::clone(&parser);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let outcome = process_file(parser.as_ref(), &path);
                FileReport { path, outcome }
            });
        }

        let mut reports = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let report =
                joined.map_err(|e| ParseError::Unknown(format!("Worker join error: {}", e)))?;
            reports.push(report);
        }

        debug!(parser = parser.format_id(), reports = reports.len(), "Item files processed");
        Ok(reports)
    }
}
