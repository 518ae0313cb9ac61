mod binary;
mod filter;
mod options;
mod render;


pub use binary::BinaryExtensions;
pub use options::{Extensions, QueryOptions, SearchOptions, SortKey, SortOptions, SortOrder};

use crate::ops::SizeUnit;
use crate::sandbox::Result;
use crate::security::ResolvedPath;
use crate::walker::DirectoryWalker;
use chrono::{FixedOffset, Offset, Utc};
use filter::FileFilter;
use render::{render_lines, visibility, DetailFormat, TreeBuilder};
use std::fs;

/// Returned in place of a tree when a search regex does not compile
pub const INVALID_PATTERN: &str = "Invalid pattern";

/// Renders filtered, sorted, indented directory trees
#[derive(Debug, Clone)]
pub struct TreeQuery {
    binary: BinaryExtensions,
    detail_unit: SizeUnit,
    offset: FixedOffset,
}

impl Default for TreeQuery {
    fn default() -> Self {
        Self::new(BinaryExtensions::default(), SizeUnit::default(), 0)
    }
}

impl TreeQuery {
    /// `utc_offset_minutes` is the fixed offset used for detail timestamps;
    /// an out-of-range value falls back to UTC.
    pub fn new(binary: BinaryExtensions, detail_unit: SizeUnit, utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self {
            binary,
            detail_unit,
            offset,
        }
    }

    pub fn binary_extensions(&self) -> &BinaryExtensions {
        &self.binary
    }

    /// Render the tree under `root`.
    ///
    /// Returns `Ok(None)` when `root` is missing or not a directory, and
    /// [`crate::SandboxError::Pattern`] when a search regex is malformed.
    /// An empty string means nothing under `root` qualified.
    pub fn render(&self, root: &ResolvedPath, options: &QueryOptions) -> Result<Option<String>> {
        let filter = FileFilter::new(&options.search, &self.binary)?;

        match fs::metadata(root.as_path()) {
            Ok(metadata) if metadata.is_dir() => {}
            _ => return Ok(None),
        }

        let mut builder = TreeBuilder::new(&filter);
        let nodes = DirectoryWalker::pre_order().walk(root, &mut builder, Vec::new());
        if nodes.is_empty() {
            return Ok(None);
        }

        let visible = visibility(&nodes, options.show_empty_folders);
        let detail = options.detail.then_some(DetailFormat {
            unit: self.detail_unit,
            offset: self.offset,
        });
        Ok(Some(render_lines(&nodes, &visible, options.sort, detail)))
    }
}
