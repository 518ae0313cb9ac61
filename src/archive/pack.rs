use crate::ops::pipe;
use crate::sandbox::{Result, SandboxError};
use crate::security::ResolvedPath;
use crate::walker::{DirectoryWalker, Visitor, WalkEntry};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Permission bits of the source file, when the platform has them
#[cfg(unix)]
fn source_mode(metadata: Option<&fs::Metadata>) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    metadata.map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn source_mode(_metadata: Option<&fs::Metadata>) -> Option<u32> {
    None
}

/// Entry options carrying the file's own modification time; permissions are
/// left to the writer's defaults
fn entry_options(metadata: Option<&fs::Metadata>) -> SimpleFileOptions {
    let modified: DateTime<Local> = metadata
        .and_then(|m| m.modified().ok())
        .map(DateTime::from)
        .unwrap_or_else(Local::now);
    let large = metadata.map(|m| m.len() >= u32::MAX as u64).unwrap_or(false);

    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(large)
        .last_modified_time(
            zip::DateTime::from_date_and_time(
                modified.year().clamp(1980, 2107) as u16,
                modified.month() as u8,
                modified.day() as u8,
                modified.hour() as u8,
                modified.minute() as u8,
                modified.second() as u8,
            )
            .unwrap_or_default(),
        )
}

/// Stream one file into the archive under `name`
fn write_file_entry<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    name: String,
    source: &Path,
    metadata: Option<&fs::Metadata>,
    buffer_size: usize,
) -> Result<u64> {
    let mut options = entry_options(metadata);
    if let Some(mode) = source_mode(metadata) {
        options = options.unix_permissions(mode);
    }
    zip.start_file(name, options)?;
    let mut reader = File::open(source).map_err(|e| SandboxError::io(source, e))?;
    pipe(&mut reader, zip, buffer_size).map_err(|e| SandboxError::io(source, e))
}

#[derive(Default)]
struct PackOutcome {
    files: u64,
    directories: u64,
    error: Option<SandboxError>,
}

struct PackVisitor<'a> {
    zip: ZipWriter<File>,
    archive_path: &'a Path,
    buffer_size: usize,
}

impl Visitor<PackOutcome> for PackVisitor<'_> {
    fn on_dir(&mut self, entry: &WalkEntry<'_>, outcome: &mut PackOutcome) {
        if outcome.error.is_some() || entry.is_root() {
            return;
        }
        let is_empty = fs::read_dir(entry.path())
            .map(|mut children| children.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            return;
        }

        let name = format!("{}/", entry.relative_name());
        let options = entry_options(entry.metadata().as_ref());
        match self.zip.add_directory(name, options) {
            Ok(()) => outcome.directories += 1,
            Err(err) => outcome.error = Some(err.into()),
        }
    }

    fn on_file(&mut self, entry: &WalkEntry<'_>, outcome: &mut PackOutcome) {
        if outcome.error.is_some() {
            return;
        }
        if entry.is_symlink() {
            debug!(path = %entry.path().display(), "Skipping symlink while packing");
            return;
        }
        if entry.path() == self.archive_path {
            return;
        }

        let metadata = entry.metadata();
        let result = write_file_entry(
            &mut self.zip,
            entry.relative_name(),
            entry.path(),
            metadata.as_ref(),
            self.buffer_size,
        );
        match result {
            Ok(_) => outcome.files += 1,
            Err(err) => outcome.error = Some(err),
        }
    }
}

/// Write `source` (file or directory) into a new ZIP at `archive`.
///
/// A partially written archive is removed when packing fails.
pub(crate) fn pack(source: &ResolvedPath, archive: &ResolvedPath, buffer_size: usize) -> Result<()> {
    let metadata = fs::metadata(source.as_path()).map_err(|_| SandboxError::not_found(source))?;
    if source == archive {
        return Err(SandboxError::InvalidPath(format!(
            "Archive would overwrite its own source: {}",
            archive
        )));
    }

    if let Some(parent) = archive.parent() {
        fs::create_dir_all(parent).map_err(|e| SandboxError::io(parent, e))?;
    }
    let file = File::create(archive.as_path()).map_err(|e| SandboxError::io(archive, e))?;

    let result = if metadata.is_dir() {
        pack_directory(ZipWriter::new(file), source, archive, buffer_size)
    } else {
        pack_file(ZipWriter::new(file), source, &metadata, buffer_size)
    };

    if result.is_err() {
        if let Err(err) = fs::remove_file(archive.as_path()) {
            debug!(archive = %archive, error = %err, "Could not remove partial archive");
        }
    }
    result
}

fn pack_file(
    mut zip: ZipWriter<File>,
    source: &ResolvedPath,
    metadata: &fs::Metadata,
    buffer_size: usize,
) -> Result<()> {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SandboxError::InvalidPath(format!("{} has no file name", source)))?;
    write_file_entry(&mut zip, name, source, Some(metadata), buffer_size)?;
    zip.finish()?;
    debug!(source = %source, "Packed single file");
    Ok(())
}

fn pack_directory(
    zip: ZipWriter<File>,
    source: &ResolvedPath,
    archive: &ResolvedPath,
    buffer_size: usize,
) -> Result<()> {
    let mut visitor = PackVisitor {
        zip,
        archive_path: archive.as_path(),
        buffer_size,
    };
    let outcome = DirectoryWalker::pre_order().walk(source, &mut visitor, PackOutcome::default());
    if let Some(err) = outcome.error {
        return Err(err);
    }
    visitor.zip.finish()?;

    debug!(
        source = %source,
        files = outcome.files,
        empty_dirs = outcome.directories,
        "Packed directory"
    );
    Ok(())
}
