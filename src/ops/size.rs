use crate::security::ResolvedPath;
use crate::walker::{DirectoryWalker, Visitor, WalkEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::str::FromStr;

/// Unit a byte count is reported in (powers of 1024)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    B,
    Kb,
    #[default]
    Mb,
    Gb,
    Tb,
}

impl SizeUnit {
    /// Parse a unit name, falling back to megabytes when absent or unknown
    pub fn from_name_or_default(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }

    fn exponent(self) -> i32 {
        match self {
            SizeUnit::B => 0,
            SizeUnit::Kb => 1,
            SizeUnit::Mb => 2,
            SizeUnit::Gb => 3,
            SizeUnit::Tb => 4,
        }
    }

    /// Convert a byte count into this unit, rounded to 2 decimal places
    pub fn convert(self, bytes: u64) -> f64 {
        let value = bytes as f64 / 1024f64.powi(self.exponent());
        (value * 100.0).round() / 100.0
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeUnit::B => "B",
            SizeUnit::Kb => "KB",
            SizeUnit::Mb => "MB",
            SizeUnit::Gb => "GB",
            SizeUnit::Tb => "TB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" => Ok(SizeUnit::B),
            "kb" => Ok(SizeUnit::Kb),
            "mb" => Ok(SizeUnit::Mb),
            "gb" => Ok(SizeUnit::Gb),
            "tb" => Ok(SizeUnit::Tb),
            other => Err(format!("unknown size unit: {other}")),
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct SizeVisitor;

impl Visitor<u64> for SizeVisitor {
    fn on_file(&mut self, entry: &WalkEntry<'_>, total: &mut u64) {
        if let Some(metadata) = entry.metadata() {
            *total = total.saturating_add(metadata.len());
        }
    }
}

/// Total byte length of a file or subtree; `None` if the path does not exist
pub fn byte_size(path: &ResolvedPath) -> Option<u64> {
    let metadata = fs::symlink_metadata(path.as_path()).ok()?;
    if !metadata.is_dir() {
        return Some(metadata.len());
    }
    Some(DirectoryWalker::pre_order().walk(path, &mut SizeVisitor, 0))
}

/// Storage size of a file or subtree converted to `unit`
pub fn storage_size(path: &ResolvedPath, unit: SizeUnit) -> Option<f64> {
    byte_size(path).map(|bytes| unit.convert(bytes))
}
