use crate::ops::pipe;
use crate::sandbox::{Result, SandboxError};
use crate::security::{canonicalize_lenient, is_strictly_within, ResolvedPath};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// `C:`-style volume marker at the start of an entry name
fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Canonical output path for an entry, which must land strictly inside `root`
pub(crate) fn entry_target(root: &Path, name: &str) -> Result<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') || has_drive_prefix(&normalized) {
        warn!(entry = name, "Rejected absolute archive entry");
        return Err(SandboxError::escape(name));
    }

    let candidate = root.join(&normalized);
    let canonical = canonicalize_lenient(&candidate)
        .map_err(|e| SandboxError::InvalidPath(format!("{}: {}", name, e)))?;

    if !is_strictly_within(root, &canonical) {
        warn!(
            entry = name,
            resolved = %canonical.display(),
            destination = %root.display(),
            "Rejected archive entry escaping destination"
        );
        return Err(SandboxError::escape(name));
    }
    Ok(canonical)
}

/// Extract `archive` into `destination`.
///
/// Every entry name is checked before anything is written, so a hostile
/// archive leaves no files behind. The check runs again per entry during
/// extraction.
pub(crate) fn unpack(archive: &ResolvedPath, destination: &ResolvedPath, buffer_size: usize) -> Result<()> {
    let file = File::open(archive.as_path()).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SandboxError::not_found(archive),
        _ => SandboxError::io(archive, e),
    })?;
    let mut zip = ZipArchive::new(file)?;

    let created = !destination.exists();
    fs::create_dir_all(destination.as_path()).map_err(|e| SandboxError::io(destination, e))?;
    let root = fs::canonicalize(destination.as_path()).map_err(|e| SandboxError::io(destination, e))?;

    if let Err(err) = validate_entries(&mut zip, &root) {
        if created {
            let _ = fs::remove_dir(&root);
        }
        return Err(err);
    }

    let mut files = 0u64;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let target = entry_target(&root, entry.name())?;

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| SandboxError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| SandboxError::io(parent, e))?;
        }
        let mut output = File::create(&target).map_err(|e| SandboxError::io(&target, e))?;
        pipe(&mut entry, &mut output, buffer_size).map_err(|e| SandboxError::io(&target, e))?;
        files += 1;
    }

    debug!(archive = %archive, destination = %root.display(), files, "Unpacked archive");
    Ok(())
}

fn validate_entries(zip: &mut ZipArchive<File>, root: &Path) -> Result<()> {
    for index in 0..zip.len() {
        let entry = zip.by_index_raw(index)?;
        entry_target(root, entry.name())?;
    }
    Ok(())
}
