//! Branch archive extraction.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::harvest::pipeline::{Extractor, SourceInfo, TempExtraction};
use crate::harvest::traits::ExtractionError;
use crate::model::RepoSpec;

/// Unpacks the item folder of a branch zip into `<dest>/<archive root>/`.
///
/// Entries outside `<archive root>/<folder>/` are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn execute(
        &self,
        archive: Vec<u8>,
        repo: &RepoSpec,
        dest: &Path,
        cleanup_on_drop: bool,
    ) -> Result<TempExtraction, ExtractionError> {
        let archive_bytes = archive.len() as u64;
        let mut zip = ZipArchive::new(Cursor::new(archive))?;

        let root = dest.join(repo.archive_root());
        if root.exists() {
            warn!(path = %root.display(), "Removing stale extraction directory");
            fs::remove_dir_all(&root)?;
        }

        let mut temp = TempExtraction::new(
            root,
            repo.folder.clone(),
            SourceInfo {
                url: repo.archive_url(),
                archive_bytes,
                files_extracted: 0,
            },
            cleanup_on_drop,
        );

        let root_prefix = format!("{}/", repo.archive_root());
        let wanted = repo.extract_prefix();

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            let name = entry.name().to_string();
            if !name.starts_with(&wanted) {
                continue;
            }

            let target = temp.safe_child(Path::new(&name[root_prefix.len()..]))?;
            if entry.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
            temp.source_info.files_extracted += 1;
        }

        debug!(
            files = temp.source_info.files_extracted,
            path = %temp.path.display(),
            "Archive subtree extracted"
        );
        Ok(temp)
    }

    fn stage_name(&self) -> &'static str {
        "extract"
    }
}
