use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Snapshot of a single filesystem node, read at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSystemEntry {
    /// Final path component (e.g., "notes.txt")
    pub name: String,
    /// Canonical absolute path
    pub absolute_path: String,
    /// Whether the node is a directory
    pub is_directory: bool,
    /// Length in bytes (0 for directories)
    pub size_bytes: u64,
    /// Last modification time as Unix epoch milliseconds
    pub last_modified_epoch_ms: i64,
}

impl FileSystemEntry {
    /// Build an entry from a path and its metadata
    pub fn from_metadata(path: &Path, metadata: &fs::Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let is_directory = metadata.is_dir();

        Self {
            name,
            absolute_path: path.to_string_lossy().into_owned(),
            is_directory,
            size_bytes: if is_directory { 0 } else { metadata.len() },
            last_modified_epoch_ms: modified_epoch_ms(metadata),
        }
    }
}

/// Modification time in epoch milliseconds, 0 when the platform cannot report it
pub(crate) fn modified_epoch_ms(metadata: &fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
