mod config;
pub(crate) mod entry;
mod error;


pub use config::SandboxConfig;
pub use entry::FileSystemEntry;
pub use error::{Result, SandboxError};

use crate::archive::{default_archive_path, default_extract_dir, ArchiveCodec};
use crate::ops::{storage_size, FileOps, SizeUnit};
use crate::security::{PathResolver, ResolvedPath};
use crate::tree::{BinaryExtensions, QueryOptions, TreeQuery, INVALID_PATTERN};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// Sandboxed filesystem toolkit.
///
/// Every operation resolves its path arguments through the [`PathResolver`]
/// first and reports failure as a sentinel (`false` / `None`) after logging
/// it. Use [`Sandbox::resolve`] and the component types directly when the
/// underlying [`SandboxError`] is needed.
#[derive(Debug, Clone)]
pub struct Sandbox {
    config: SandboxConfig,
    resolver: PathResolver,
    ops: FileOps,
    codec: ArchiveCodec,
    tree: TreeQuery,
}

/// Builder for a [`Sandbox`]
#[derive(Debug, Clone, Default)]
pub struct SandboxBuilder {
    config: SandboxConfig,
}

impl SandboxBuilder {
    /// Create a builder for an unrestricted sandbox with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously loaded settings
    pub fn from_config(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Confine every operation under `path`, creating it at build time if missing
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_path = Some(path.into());
        self
    }

    /// Register an absolute prefix that is resolved directly (e.g. a mounted volume)
    pub fn trusted_root(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.config.trusted_roots.push(prefix.into());
        self
    }

    /// Set the streaming buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Exclude another extension from content search
    pub fn binary_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.extra_binary_extensions.push(extension.into());
        self
    }

    /// Set the fixed offset used for detail timestamps
    pub fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.config.utc_offset_minutes = minutes;
        self
    }

    /// Set the unit used for detail sizes
    pub fn detail_unit(mut self, unit: SizeUnit) -> Self {
        self.config.detail_unit = unit;
        self
    }

    /// Finish the sandbox.
    ///
    /// Fails when the base path cannot be created or is not a directory, or
    /// when a trusted root is not absolute.
    pub fn build(self) -> Result<Sandbox> {
        let mut config = self.config;

        let mut resolver = match &config.base_path {
            Some(base) => {
                fs::create_dir_all(base).map_err(|e| SandboxError::io(base, e))?;
                PathResolver::sandboxed(base)?
            }
            None => PathResolver::unrestricted(),
        };
        for root in &config.trusted_roots {
            resolver = resolver.with_trusted_root(root)?;
        }
        config.base_path = resolver.base().map(|base| base.to_path_buf());

        let mut binary = BinaryExtensions::default();
        for extension in &config.extra_binary_extensions {
            binary.insert(extension);
        }

        debug!(
            base = ?config.base_path,
            trusted_roots = config.trusted_roots.len(),
            buffer_size = config.buffer_size,
            "Built sandbox"
        );

        Ok(Sandbox {
            ops: FileOps::new(config.buffer_size),
            codec: ArchiveCodec::new(config.buffer_size),
            tree: TreeQuery::new(binary, config.detail_unit, config.utc_offset_minutes),
            resolver,
            config,
        })
    }
}

/// Turn an internal result into the public sentinel, logging the failure
fn settle<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "Operation failed");
            None
        }
    }
}

impl Sandbox {
    pub fn builder() -> SandboxBuilder {
        SandboxBuilder::new()
    }

    /// Effective settings; `base_path` holds the canonical root
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn is_sandboxed(&self) -> bool {
        self.resolver.is_sandboxed()
    }

    /// Resolve a user path without touching the filesystem beyond canonicalization
    pub fn resolve(&self, path: &str) -> Result<ResolvedPath> {
        self.resolver.resolve(path)
    }

    /// Resolve a path that is about to be deleted or moved away; the sandbox
    /// base and trusted roots themselves are refused
    fn resolve_removable(&self, path: &str) -> Result<ResolvedPath> {
        let target = self.resolve(path)?;
        self.ensure_not_root(&target)?;
        Ok(target)
    }

    fn ensure_not_root(&self, target: &ResolvedPath) -> Result<()> {
        if self.resolver.is_root(target) {
            warn!(path = %target, "Refused to remove a sandbox root");
            return Err(SandboxError::escape(target));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn create_directory(&self, path: &str) -> bool {
        let result = self
            .resolve(path)
            .and_then(|target| self.ops.create_directory(&target));
        settle(result).is_some()
    }

    /// Best-effort recursive delete; `false` if anything could not be removed
    #[instrument(skip(self))]
    pub fn delete_directory(&self, path: &str) -> bool {
        let result = self
            .resolve_removable(path)
            .and_then(|target| self.ops.delete_directory(&target));
        settle(result).is_some()
    }

    /// Delete a file or directory; a missing path counts as success
    #[instrument(skip(self))]
    pub fn remove(&self, path: &str) -> bool {
        let result = self
            .resolve_removable(path)
            .and_then(|target| self.ops.remove(&target));
        settle(result).is_some()
    }

    /// Delete a file or directory; a missing path is a failure
    #[instrument(skip(self))]
    pub fn delete(&self, path: &str) -> bool {
        let result = self
            .resolve_removable(path)
            .and_then(|target| self.ops.delete(&target));
        settle(result).is_some()
    }

    /// Render the filtered tree under `path`.
    ///
    /// `None` when the path is rejected, missing or not a directory;
    /// [`INVALID_PATTERN`] when a search regex does not compile.
    #[instrument(skip(self, options))]
    pub fn get_directory_tree(&self, path: &str, options: &QueryOptions) -> Option<String> {
        let result = self
            .resolve(path)
            .and_then(|root| self.tree.render(&root, options));
        match result {
            Ok(tree) => tree,
            Err(SandboxError::Pattern(err)) => {
                warn!(error = %err, "Malformed search pattern");
                Some(INVALID_PATTERN.to_string())
            }
            Err(err) => {
                warn!(error = %err, "Operation failed");
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub fn get_metadata(&self, path: &str) -> Option<FileSystemEntry> {
        settle(self.resolve(path).and_then(|target| self.ops.metadata(&target)))
    }

    #[instrument(skip(self))]
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        settle(self.resolve(path).and_then(|target| self.ops.read(&target)))
    }

    /// Read a file as UTF-8 text
    #[instrument(skip(self))]
    pub fn read_to_string(&self, path: &str) -> Option<String> {
        let result = self.resolve(path).and_then(|target| {
            let bytes = self.ops.read(&target)?;
            String::from_utf8(bytes)
                .map_err(|e| SandboxError::io(&target, io::Error::new(io::ErrorKind::InvalidData, e)))
        });
        settle(result)
    }

    /// Replace the content of `path`, creating it and its parents as needed
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub fn write(&self, path: &str, data: &[u8]) -> bool {
        let result = self.resolve(path).and_then(|target| self.ops.write(&target, data));
        settle(result).is_some()
    }

    /// Append to `path`, creating it when absent
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub fn append(&self, path: &str, data: &[u8]) -> bool {
        let result = self.resolve(path).and_then(|target| self.ops.append(&target, data));
        settle(result).is_some()
    }

    /// Copy a file or directory tree to `destination`
    #[instrument(skip(self))]
    pub fn copy(&self, source: &str, destination: &str) -> bool {
        let result = self.resolve(source).and_then(|from| {
            let to = self.resolve(destination)?;
            self.ops.copy(&from, &to)
        });
        settle(result).is_some()
    }

    /// Move `source` to `destination`; the source survives a failed copy fallback
    #[instrument(skip(self))]
    pub fn move_path(&self, source: &str, destination: &str) -> bool {
        let result = self.resolve_removable(source).and_then(|from| {
            let to = self.resolve(destination)?;
            self.ops.move_path(&from, &to)
        });
        settle(result).is_some()
    }

    /// Copy each source to `destination_dir/<source name>`.
    ///
    /// Every source is attempted; `true` only if all of them succeeded.
    #[instrument(skip(self))]
    pub fn copy_all(&self, sources: &[&str], destination_dir: &str) -> bool {
        self.each_into(sources, destination_dir, |from, to| self.ops.copy(from, to))
    }

    /// Move each source to `destination_dir/<source name>`.
    ///
    /// Every source is attempted; `true` only if all of them succeeded.
    #[instrument(skip(self))]
    pub fn move_all(&self, sources: &[&str], destination_dir: &str) -> bool {
        self.each_into(sources, destination_dir, |from, to| {
            self.ensure_not_root(from)?;
            self.ops.move_path(from, to)
        })
    }

    fn each_into<F>(&self, sources: &[&str], destination_dir: &str, op: F) -> bool
    where
        F: Fn(&ResolvedPath, &ResolvedPath) -> Result<()>,
    {
        let Some(directory) = settle(self.resolve(destination_dir)) else {
            return false;
        };

        let mut all_succeeded = true;
        for source in sources {
            let result = self.resolve(source).and_then(|from| {
                let name = from.file_name().ok_or_else(|| {
                    SandboxError::InvalidPath(format!("{} has no file name", from))
                })?;
                let to = self.resolver.resolve(directory.join(name))?;
                op(&from, &to)
            });
            if let Err(err) = result {
                warn!(source = *source, error = %err, "Item failed");
                all_succeeded = false;
            }
        }
        all_succeeded
    }

    /// Pack `source` into a ZIP archive.
    ///
    /// Without `archive` the path defaults to `<parent>/<stem>.zip`, which is
    /// confined like any user path. Returns the archive path.
    #[instrument(skip(self))]
    pub fn zip(&self, source: &str, archive: Option<&str>) -> Option<PathBuf> {
        let result = self.resolve(source).and_then(|from| {
            let archive = match archive {
                Some(path) => self.resolve(path)?,
                None => self.resolver.resolve(default_archive_path(&from))?,
            };
            self.codec.pack(&from, &archive)?;
            Ok(archive.into_path_buf())
        });
        settle(result)
    }

    /// Extract `archive`, rejecting any entry that would land outside the destination.
    ///
    /// Without `destination` the archive is extracted next to itself into a
    /// directory named after its stem. Returns the destination path.
    #[instrument(skip(self))]
    pub fn unzip(&self, archive: &str, destination: Option<&str>) -> Option<PathBuf> {
        let result = self.resolve(archive).and_then(|from| {
            let destination = match destination {
                Some(path) => self.resolve(path)?,
                None => self.resolver.resolve(default_extract_dir(&from))?,
            };
            self.codec.unpack(&from, &destination)?;
            Ok(destination.into_path_buf())
        });
        settle(result)
    }

    /// Recursive size of `path` in `unit`, `None` when it is rejected or missing
    #[instrument(skip(self))]
    pub fn storage_size(&self, path: &str, unit: SizeUnit) -> Option<f64> {
        let target = settle(self.resolve(path))?;
        storage_size(&target, unit)
    }
}
