use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path escapes sandbox root: {}", path.display())]
    SecurityViolation { path: PathBuf },

    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to delete {failed} item(s) under {}", path.display())]
    DeleteIncomplete { path: PathBuf, failed: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SandboxError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SandboxError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn not_found(path: impl AsRef<Path>) -> Self {
        SandboxError::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub(crate) fn escape(path: impl AsRef<Path>) -> Self {
        SandboxError::SecurityViolation {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Whether this error is a sandbox or Zip-Slip escape
    pub fn is_security_violation(&self) -> bool {
        matches!(self, SandboxError::SecurityViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, SandboxError>;
