use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::formatting;

/// Coordinates of the remote repository whose item folder gets harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub host: String,
    pub owner: String,
    pub name: String,
    pub branch: String,
    /// Folder inside the repository holding one JSON file per item
    pub folder: String,
}

impl Default for RepoSpec {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            owner: "NotEnoughUpdates".to_string(),
            name: "NotEnoughUpdates-REPO".to_string(),
            branch: "master".to_string(),
            folder: "items".to_string(),
        }
    }
}

impl RepoSpec {
    /// `owner/name`
    pub fn coordinate(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn archive_url(&self) -> String {
        format!(
            "https://{}/{}/{}/archive/refs/heads/{}.zip",
            self.host, self.owner, self.name, self.branch
        )
    }

    /// Top-level directory of the branch archive, e.g. `NotEnoughUpdates-REPO-master`.
    ///
    /// Slashes in branch names are flattened to dashes in archive roots.
    pub fn archive_root(&self) -> String {
        format!("{}-{}", self.name, self.branch.replace('/', "-"))
    }

    /// Archive path prefix of the entries worth extracting.
    pub fn extract_prefix(&self) -> String {
        format!("{}/{}/", self.archive_root(), self.folder)
    }
}

/// One item descriptor as stored in the repository.
///
/// Only the two fields the table needs are read; everything else in the file
/// is ignored. Absent and `null` fields both read as the empty string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemRecord {
    #[serde(default)]
    pub internalname: Option<String>,
    #[serde(default)]
    pub displayname: Option<String>,
}

impl ItemRecord {
    pub fn internal_name(&self) -> &str {
        self.internalname.as_deref().unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.displayname.as_deref().unwrap_or_default()
    }
}

/// Value side of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
}

impl ItemEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name with Minecraft colour codes removed.
    pub fn plain_name(&self) -> String {
        formatting::strip_formatting(&self.name)
    }
}

/// Identifier → entry lookup table written to `data/items.json`.
///
/// Keys are kept sorted so the serialized table is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTable {
    entries: BTreeMap<String, ItemEntry>,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the one it replaced (last write wins).
    pub fn insert(&mut self, id: String, entry: ItemEntry) -> Option<ItemEntry> {
        self.entries.insert(id, entry)
    }

    pub fn get(&self, id: &str) -> Option<&ItemEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
