// Public API exports
pub mod archive;
pub mod ops;
pub mod sandbox;
pub mod security;
pub mod tree;
pub mod walker;

// Re-export main types for convenience
pub use sandbox::{FileSystemEntry, Result, Sandbox, SandboxBuilder, SandboxConfig, SandboxError};
pub use security::{PathResolver, ResolvedPath};

pub use walker::{DirectoryWalker, Order, Visitor, WalkEntry};

pub use ops::{byte_size, storage_size, FileOps, SizeUnit, DEFAULT_BUFFER_SIZE};

pub use archive::{ArchiveCodec, ARCHIVE_EXTENSION};

pub use tree::{
    BinaryExtensions, Extensions, QueryOptions, SearchOptions, SortKey, SortOptions, SortOrder,
    TreeQuery, INVALID_PATTERN,
};
