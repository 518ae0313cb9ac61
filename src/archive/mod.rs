mod pack;
mod unpack;


use crate::ops::DEFAULT_BUFFER_SIZE;
use crate::sandbox::Result;
use crate::security::ResolvedPath;
use std::path::{Path, PathBuf};

/// Extension given to archives whose path is derived from their source
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Packs subtrees into ZIP archives and extracts them with Zip-Slip checks
#[derive(Debug, Clone, Copy)]
pub struct ArchiveCodec {
    buffer_size: usize,
}

impl Default for ArchiveCodec {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ArchiveCodec {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Pack a file (one entry named after it) or a directory (entries
    /// relative to its contents, empty directories as `name/` markers)
    pub fn pack(&self, source: &ResolvedPath, archive: &ResolvedPath) -> Result<()> {
        pack::pack(source, archive, self.buffer_size)
    }

    /// Extract every entry of `archive` under `destination`
    pub fn unpack(&self, archive: &ResolvedPath, destination: &ResolvedPath) -> Result<()> {
        unpack::unpack(archive, destination, self.buffer_size)
    }
}

fn stem_of(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// `<parent>/<stem>.zip` next to `source`
pub fn default_archive_path(source: &Path) -> PathBuf {
    let parent = source.parent().unwrap_or(source);
    parent.join(format!("{}.{}", stem_of(source, "archive"), ARCHIVE_EXTENSION))
}

/// `<parent>/<stem>` next to `archive`
pub fn default_extract_dir(archive: &Path) -> PathBuf {
    let parent = archive.parent().unwrap_or(archive);
    parent.join(stem_of(archive, "extracted"))
}
