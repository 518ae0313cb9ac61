use crate::ops::{SizeUnit, DEFAULT_BUFFER_SIZE};
use crate::sandbox::{Result, SandboxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Construction-time settings for a [`crate::Sandbox`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SandboxConfig {
    /// Sandbox root; `None` means an unrestricted install
    pub base_path: Option<PathBuf>,
    /// Absolute prefixes resolved directly and confined to themselves
    pub trusted_roots: Vec<PathBuf>,
    /// Streaming buffer for copies and archive entries
    pub buffer_size: usize,
    /// Added to the built-in set of extensions skipped by content search
    pub extra_binary_extensions: Vec<String>,
    /// Fixed offset used for detail timestamps
    pub utc_offset_minutes: i32,
    /// Unit used for detail sizes
    pub detail_unit: SizeUnit,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            trusted_roots: Vec::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            extra_binary_extensions: Vec::new(),
            utc_offset_minutes: 0,
            detail_unit: SizeUnit::Mb,
        }
    }
}

impl SandboxConfig {
    /// Load settings from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| SandboxError::io(path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| SandboxError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn is_sandboxed(&self) -> bool {
        self.base_path.is_some()
    }
}
