mod entry;

#[cfg(test)]
mod tests;

pub use entry::WalkEntry;

use crate::security::ResolvedPath;
use std::fs;
use tracing::debug;
use walkdir::WalkDir;

/// When a directory is reported relative to its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Directory first, then its contents
    #[default]
    Pre,
    /// Contents first, then the directory
    Post,
}

/// Per-node behavior plugged into a [`DirectoryWalker`].
///
/// The accumulator `C` is threaded through by mutable reference and handed
/// back to the caller when the walk ends.
pub trait Visitor<C> {
    /// Called for every non-directory node, as it is encountered
    fn on_file(&mut self, _entry: &WalkEntry<'_>, _ctx: &mut C) {}

    /// Called for every directory, before or after its contents per [`Order`]
    fn on_dir(&mut self, _entry: &WalkEntry<'_>, _ctx: &mut C) {}
}

/// Iterative traversal over a rooted subtree.
///
/// Children come in filesystem listing order. Symlinks are never followed
/// and are reported as leaves. An unreadable directory is treated as
/// empty and the walk carries on.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryWalker {
    order: Order,
}

impl DirectoryWalker {
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    pub fn pre_order() -> Self {
        Self::new(Order::Pre)
    }

    pub fn post_order() -> Self {
        Self::new(Order::Post)
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Walk `root`, feeding every node to `visitor`, and return the accumulator.
    ///
    /// A missing root returns `ctx` untouched. The root itself is visited at
    /// depth 0; a file root yields a single `on_file` call.
    pub fn walk<C, V>(&self, root: &ResolvedPath, visitor: &mut V, mut ctx: C) -> C
    where
        V: Visitor<C>,
    {
        if fs::symlink_metadata(root.as_path()).is_err() {
            return ctx;
        }

        let walk = WalkDir::new(root.as_path())
            .follow_links(false)
            .contents_first(self.order == Order::Post);

        for item in walk {
            let dir_entry = match item {
                Ok(dir_entry) => dir_entry,
                Err(err) => {
                    debug!(error = %err, "Skipping unreadable entry during walk");
                    continue;
                }
            };

            let entry = WalkEntry::new(root.as_path(), &dir_entry);
            if entry.is_dir() {
                visitor.on_dir(&entry, &mut ctx);
            } else {
                visitor.on_file(&entry, &mut ctx);
            }
        }

        ctx
    }
}
