mod size;
mod stream;

#[cfg(test)]
mod tests;

pub use size::{byte_size, storage_size, SizeUnit};
pub use stream::DEFAULT_BUFFER_SIZE;

pub(crate) use stream::pipe;

use crate::sandbox::{FileSystemEntry, Result, SandboxError};
use crate::security::{is_within, ResolvedPath};
use crate::walker::{DirectoryWalker, Visitor, WalkEntry};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy, move, delete and raw byte primitives over resolved paths
#[derive(Debug, Clone, Copy)]
pub struct FileOps {
    buffer_size: usize,
}

impl Default for FileOps {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl FileOps {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Create a directory and any missing ancestors; an existing path is left alone
    pub fn create_directory(&self, path: &ResolvedPath) -> Result<()> {
        if fs::symlink_metadata(path.as_path()).is_ok() {
            return Ok(());
        }
        fs::create_dir_all(path.as_path()).map_err(|e| SandboxError::io(path, e))
    }

    /// Delete a file, or a directory tree bottom-up.
    ///
    /// Individual failures do not stop the remaining deletions; they are
    /// counted and reported as [`SandboxError::DeleteIncomplete`].
    pub fn delete_directory(&self, path: &ResolvedPath) -> Result<()> {
        let metadata = stat(path)?;
        if !metadata.is_dir() {
            return fs::remove_file(path.as_path()).map_err(|e| SandboxError::io(path, e));
        }

        let failed = DirectoryWalker::post_order().walk(path, &mut DeleteVisitor, 0usize);
        if failed > 0 {
            return Err(SandboxError::DeleteIncomplete {
                path: path.to_path_buf(),
                failed,
            });
        }
        Ok(())
    }

    /// Delete whatever is at `path`; a missing path counts as success
    pub fn remove(&self, path: &ResolvedPath) -> Result<()> {
        match self.delete(path) {
            Err(SandboxError::NotFound { .. }) => Ok(()),
            other => other,
        }
    }

    /// Delete whatever is at `path`; a missing path is an error
    pub fn delete(&self, path: &ResolvedPath) -> Result<()> {
        let metadata = stat_link(path)?;
        if metadata.is_dir() {
            self.delete_directory(path)
        } else {
            fs::remove_file(path.as_path()).map_err(|e| SandboxError::io(path, e))
        }
    }

    /// Copy a file or a whole directory tree to `destination`
    pub fn copy(&self, source: &ResolvedPath, destination: &ResolvedPath) -> Result<()> {
        let metadata = stat(source)?;
        if source == destination {
            return Err(SandboxError::InvalidPath(format!(
                "Source and destination are the same: {}",
                source.display()
            )));
        }
        if !metadata.is_dir() {
            copy_file(source, destination, self.buffer_size)?;
            return Ok(());
        }

        if is_within(source, destination) {
            return Err(SandboxError::InvalidPath(format!(
                "Cannot copy {} into itself",
                source.display()
            )));
        }

        let mut visitor = CopyVisitor {
            destination: destination.as_path(),
            buffer_size: self.buffer_size,
        };
        let outcome = DirectoryWalker::pre_order().walk(source, &mut visitor, CopyOutcome::default());
        if let Some(err) = outcome.error {
            return Err(err);
        }

        debug!(
            source = %source,
            destination = %destination,
            files = outcome.files,
            bytes = outcome.bytes,
            "Copied directory"
        );
        Ok(())
    }

    /// Rename `source` onto `destination`, falling back to copy then delete.
    ///
    /// The source is only deleted after the copy fully succeeded.
    pub fn move_path(&self, source: &ResolvedPath, destination: &ResolvedPath) -> Result<()> {
        stat_link(source)?;
        match fs::rename(source.as_path(), destination.as_path()) {
            Ok(()) => Ok(()),
            Err(err) => {
                debug!(error = %err, source = %source, "Rename failed, falling back to copy");
                self.copy(source, destination)?;
                self.remove(source)
            }
        }
    }

    pub fn read(&self, path: &ResolvedPath) -> Result<Vec<u8>> {
        fs::read(path.as_path()).map_err(|e| map_missing(path, e))
    }

    /// Write `data` to `path`, creating parents and truncating existing content
    pub fn write(&self, path: &ResolvedPath, data: &[u8]) -> Result<()> {
        ensure_parent(path)?;
        fs::write(path.as_path(), data).map_err(|e| SandboxError::io(path, e))
    }

    /// Append `data` to `path`, creating it when absent
    pub fn append(&self, path: &ResolvedPath, data: &[u8]) -> Result<()> {
        ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_path())
            .map_err(|e| SandboxError::io(path, e))?;
        file.write_all(data).map_err(|e| SandboxError::io(path, e))
    }

    pub fn metadata(&self, path: &ResolvedPath) -> Result<FileSystemEntry> {
        let metadata = stat(path)?;
        Ok(FileSystemEntry::from_metadata(path, &metadata))
    }
}

fn map_missing(path: &Path, err: io::Error) -> SandboxError {
    if err.kind() == io::ErrorKind::NotFound {
        SandboxError::not_found(path)
    } else {
        SandboxError::io(path, err)
    }
}

fn stat(path: &Path) -> Result<fs::Metadata> {
    fs::metadata(path).map_err(|e| map_missing(path, e))
}

fn stat_link(path: &Path) -> Result<fs::Metadata> {
    fs::symlink_metadata(path).map_err(|e| map_missing(path, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| SandboxError::io(parent, e)),
        None => Ok(()),
    }
}

/// Stream one file to `to`, creating its parent directories
fn copy_file(from: &Path, to: &Path, buffer_size: usize) -> Result<u64> {
    ensure_parent(to)?;
    let mut reader = File::open(from).map_err(|e| map_missing(from, e))?;
    let mut writer = File::create(to).map_err(|e| SandboxError::io(to, e))?;
    pipe(&mut reader, &mut writer, buffer_size).map_err(|e| SandboxError::io(to, e))
}

struct DeleteVisitor;

impl Visitor<usize> for DeleteVisitor {
    fn on_file(&mut self, entry: &WalkEntry<'_>, failed: &mut usize) {
        if let Err(err) = fs::remove_file(entry.path()) {
            debug!(path = %entry.path().display(), error = %err, "Failed to delete file");
            *failed += 1;
        }
    }

    fn on_dir(&mut self, entry: &WalkEntry<'_>, failed: &mut usize) {
        if let Err(err) = fs::remove_dir(entry.path()) {
            debug!(path = %entry.path().display(), error = %err, "Failed to delete directory");
            *failed += 1;
        }
    }
}

#[derive(Default)]
struct CopyOutcome {
    files: u64,
    bytes: u64,
    error: Option<SandboxError>,
}

struct CopyVisitor<'a> {
    destination: &'a Path,
    buffer_size: usize,
}

impl CopyVisitor<'_> {
    fn target(&self, entry: &WalkEntry<'_>) -> PathBuf {
        if entry.is_root() {
            self.destination.to_path_buf()
        } else {
            self.destination.join(entry.relative_path())
        }
    }
}

impl Visitor<CopyOutcome> for CopyVisitor<'_> {
    fn on_dir(&mut self, entry: &WalkEntry<'_>, outcome: &mut CopyOutcome) {
        if outcome.error.is_some() {
            return;
        }
        let target = self.target(entry);
        if let Err(err) = fs::create_dir_all(&target) {
            outcome.error = Some(SandboxError::io(&target, err));
        }
    }

    fn on_file(&mut self, entry: &WalkEntry<'_>, outcome: &mut CopyOutcome) {
        if outcome.error.is_some() {
            return;
        }
        if entry.is_symlink() {
            debug!(path = %entry.path().display(), "Skipping symlink during copy");
            return;
        }
        match copy_file(entry.path(), &self.target(entry), self.buffer_size) {
            Ok(bytes) => {
                outcome.files += 1;
                outcome.bytes += bytes;
            }
            Err(err) => outcome.error = Some(err),
        }
    }
}
