use std::io::{self, BufRead, Write};

use item_harvester::harvest::{HarvestPipeline, HttpArchiveSource, ZipExtractor};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let pipeline = HarvestPipeline::new(HttpArchiveSource::new(), ZipExtractor);
    let result = pipeline.execute().await?;

    let stats = &result.stats;
    info!(
        entries = stats.entries_written,
        decode_failures = stats.decode_failures,
        discarded = stats.discarded,
        duplicates = stats.duplicate_keys,
        duration_ms = stats.total_duration_ms,
        "Harvest of {} completed",
        pipeline.repo().coordinate()
    );

    wait_for_enter()?;
    Ok(())
}

fn wait_for_enter() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "\n\nPress Enter to exit...")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
