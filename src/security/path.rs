use crate::sandbox::{Result, SandboxError};
use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, warn};

/// An absolute, canonical path that passed sandbox confinement.
///
/// Only [`PathResolver`] hands these out, so holding one means the
/// confinement check already ran.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl Deref for ResolvedPath {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A prefix that is resolved as-is and confined to itself rather than to the base
#[derive(Debug, Clone)]
struct TrustedRoot {
    prefix: PathBuf,
    canonical: PathBuf,
}

/// Turns user-supplied path strings into sandbox-confined canonical paths
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    base: Option<PathBuf>,
    trusted: Vec<TrustedRoot>,
}

impl PathResolver {
    /// Resolver with no confinement; paths only get canonicalized
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Resolver confined to an existing base directory
    pub fn sandboxed(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let canonical =
            fs::canonicalize(base).map_err(|e| SandboxError::io(base, e))?;
        if !canonical.is_dir() {
            return Err(SandboxError::InvalidPath(format!(
                "Sandbox root is not a directory: {}",
                canonical.display()
            )));
        }

        Ok(Self {
            base: Some(canonical),
            trusted: Vec::new(),
        })
    }

    /// Register a trusted external root (e.g. a removable-storage mount)
    pub fn with_trusted_root(mut self, prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        if !prefix.is_absolute() {
            return Err(SandboxError::InvalidPath(format!(
                "Trusted root must be absolute: {}",
                prefix.display()
            )));
        }
        let canonical = canonicalize_lenient(prefix).map_err(|e| {
            SandboxError::InvalidPath(format!("{}: {}", prefix.display(), e))
        })?;
        self.trusted.push(TrustedRoot {
            prefix: prefix.to_path_buf(),
            canonical,
        });
        Ok(self)
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    pub fn is_sandboxed(&self) -> bool {
        self.base.is_some()
    }

    /// Resolve a user path into a [`ResolvedPath`].
    ///
    /// Relative input is joined onto the sandbox base; absolute input and
    /// input under a trusted root are taken as-is. Either way the canonical
    /// form must land inside its root, with a separator boundary.
    pub fn resolve(&self, user_path: impl AsRef<Path>) -> Result<ResolvedPath> {
        let user_path = user_path.as_ref();
        if user_path.to_string_lossy().trim().is_empty() {
            return Err(SandboxError::InvalidPath("Empty path".to_string()));
        }

        let Some(base) = &self.base else {
            let canonical = canonicalize_lenient(user_path).map_err(|e| {
                SandboxError::InvalidPath(format!("{}: {}", user_path.display(), e))
            })?;
            return Ok(ResolvedPath::new(canonical));
        };

        let (candidate, root) = match self.trusted_root_for(user_path) {
            Some(trusted) => (user_path.to_path_buf(), trusted.canonical.as_path()),
            None if user_path.is_absolute() => (user_path.to_path_buf(), base.as_path()),
            None => (base.join(user_path), base.as_path()),
        };

        let canonical = canonicalize_lenient(&candidate).map_err(|e| {
            SandboxError::InvalidPath(format!("{}: {}", user_path.display(), e))
        })?;

        if !is_within(root, &canonical) {
            warn!(
                requested = %user_path.display(),
                resolved = %canonical.display(),
                root = %root.display(),
                "Rejected path outside sandbox root"
            );
            return Err(SandboxError::escape(user_path));
        }

        debug!(resolved = %canonical.display(), "Resolved path");
        Ok(ResolvedPath::new(canonical))
    }

    /// Whether `path` is the sandbox base or a trusted root itself
    pub fn is_root(&self, path: &Path) -> bool {
        self.base.as_deref() == Some(path)
            || self.trusted.iter().any(|trusted| trusted.canonical == path)
    }

    fn trusted_root_for(&self, user_path: &Path) -> Option<&TrustedRoot> {
        self.trusted
            .iter()
            .find(|trusted| user_path.starts_with(&trusted.prefix))
    }
}

/// Canonical form of a path that may not exist yet.
///
/// The deepest existing ancestor is canonicalized by the OS, so symlinks
/// and `..` in it are resolved for real. The missing tail cannot contain
/// symlinks, so its `.`/`..` segments are folded lexically.
pub fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let components: Vec<Component<'_>> = absolute.components().collect();
    let mut split = components.len();
    while split > 0 {
        let prefix: PathBuf = components[..split].iter().collect();
        // symlink_metadata so a dangling link counts as existing and then fails below
        if fs::symlink_metadata(&prefix).is_ok() {
            break;
        }
        split -= 1;
    }

    let mut resolved = if split == 0 {
        PathBuf::new()
    } else {
        let prefix: PathBuf = components[..split].iter().collect();
        fs::canonicalize(prefix)?
    };

    for component in &components[split..] {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }

    Ok(resolved)
}

/// `candidate` equals `root` or lies beneath it.
///
/// Compared as canonical strings with a separator boundary, so `/base2`
/// never counts as inside `/base`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    root.as_os_str() == candidate.as_os_str() || is_strictly_within(root, candidate)
}

/// `candidate` lies beneath `root` and is not `root` itself
pub fn is_strictly_within(root: &Path, candidate: &Path) -> bool {
    let root = root.as_os_str().as_encoded_bytes();
    let candidate = candidate.as_os_str().as_encoded_bytes();
    let separator = MAIN_SEPARATOR as u8;

    if candidate.len() <= root.len() || !candidate.starts_with(root) {
        return false;
    }
    if root.last() == Some(&separator) {
        return true;
    }
    candidate[root.len()] == separator
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
