use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// One node reached during a walk
#[derive(Debug, Clone, Copy)]
pub struct WalkEntry<'a> {
    root: &'a Path,
    inner: &'a walkdir::DirEntry,
}

impl<'a> WalkEntry<'a> {
    pub(crate) fn new(root: &'a Path, inner: &'a walkdir::DirEntry) -> Self {
        Self { root, inner }
    }

    /// Absolute path of the node
    pub fn path(&self) -> &'a Path {
        self.inner.path()
    }

    /// Final path component
    pub fn file_name(&self) -> Cow<'a, str> {
        self.inner.file_name().to_string_lossy()
    }

    /// Distance from the walk root (root is 0)
    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    pub fn is_root(&self) -> bool {
        self.inner.depth() == 0
    }

    pub fn is_dir(&self) -> bool {
        self.inner.file_type().is_dir()
    }

    pub fn is_symlink(&self) -> bool {
        self.inner.path_is_symlink()
    }

    /// Path relative to the walk root (empty for the root)
    pub fn relative_path(&self) -> &'a Path {
        self.inner
            .path()
            .strip_prefix(self.root)
            .unwrap_or_else(|_| self.inner.path())
    }

    /// Relative path joined with `/`, independent of the platform separator
    pub fn relative_name(&self) -> String {
        self.relative_path()
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Metadata of the node itself (symlinks are not followed)
    pub fn metadata(&self) -> Option<fs::Metadata> {
        self.inner.metadata().ok()
    }
}
