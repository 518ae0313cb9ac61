use super::filter::FileFilter;
use super::{SortKey, SortOptions, SortOrder};
use crate::ops::SizeUnit;
use crate::sandbox::entry::modified_epoch_ms;
use crate::walker::{Visitor, WalkEntry};
use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK: &str = "    ";

/// One node of the in-memory tree; children are arena indices
#[derive(Debug)]
pub(crate) struct Node {
    name: String,
    is_dir: bool,
    size: u64,
    modified_ms: i64,
    matched: bool,
    children: Vec<usize>,
}

/// Builds the node arena from a pre-order walk
pub(crate) struct TreeBuilder<'f, 'b> {
    filter: &'f FileFilter<'b>,
    /// Open directories as (depth, arena index)
    open: Vec<(usize, usize)>,
}

impl<'f, 'b> TreeBuilder<'f, 'b> {
    pub(crate) fn new(filter: &'f FileFilter<'b>) -> Self {
        Self {
            filter,
            open: Vec::new(),
        }
    }

    fn push(&mut self, entry: &WalkEntry<'_>, matched: bool, nodes: &mut Vec<Node>) -> usize {
        let metadata = entry.metadata();
        let index = nodes.len();
        nodes.push(Node {
            name: entry.file_name().into_owned(),
            is_dir: entry.is_dir(),
            size: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
            modified_ms: metadata.as_ref().map(modified_epoch_ms).unwrap_or(0),
            matched,
            children: Vec::new(),
        });

        while let Some(&(depth, _)) = self.open.last() {
            if depth >= entry.depth() {
                self.open.pop();
            } else {
                break;
            }
        }
        if let Some(&(_, parent)) = self.open.last() {
            nodes[parent].children.push(index);
        }
        index
    }
}

impl Visitor<Vec<Node>> for TreeBuilder<'_, '_> {
    fn on_dir(&mut self, entry: &WalkEntry<'_>, nodes: &mut Vec<Node>) {
        let index = self.push(entry, false, nodes);
        self.open.push((entry.depth(), index));
    }

    fn on_file(&mut self, entry: &WalkEntry<'_>, nodes: &mut Vec<Node>) {
        let matched = self.filter.matches(entry);
        self.push(entry, matched, nodes);
    }
}

/// Which nodes survive filtering and empty-directory pruning.
///
/// Children always sit after their parent in the arena, so one reverse
/// pass sees every child before its parent.
pub(crate) fn visibility(nodes: &[Node], show_empty_folders: bool) -> Vec<bool> {
    let mut visible = vec![false; nodes.len()];
    for index in (0..nodes.len()).rev() {
        let node = &nodes[index];
        visible[index] = if node.is_dir {
            show_empty_folders || node.children.iter().any(|&c| visible[c])
        } else {
            node.matched
        };
    }
    visible
}

/// Directories first, then the requested key; `desc` flips only the key
fn compare(a: &Node, b: &Node, sort: SortOptions) -> Ordering {
    match (a.is_dir, b.is_dir) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    let ordering = match sort.by {
        SortKey::Name => compare_names(&a.name, &b.name),
        SortKey::Date => a.modified_ms.cmp(&b.modified_ms),
        SortKey::Size if a.is_dir => Ordering::Equal,
        SortKey::Size => a.size.cmp(&b.size),
    };

    match sort.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// How detail columns are printed
#[derive(Debug, Clone, Copy)]
pub(crate) struct DetailFormat {
    pub unit: SizeUnit,
    pub offset: FixedOffset,
}

impl DetailFormat {
    fn describe(&self, node: &Node) -> String {
        let modified = DateTime::from_timestamp_millis(node.modified_ms)
            .map(|t| t.with_timezone(&self.offset).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            " ({:.2} {}, {})",
            self.unit.convert(node.size),
            self.unit.label(),
            modified
        )
    }
}

/// Render every visible descendant of the arena root as indented lines
pub(crate) fn render_lines(
    nodes: &[Node],
    visible: &[bool],
    sort: SortOptions,
    detail: Option<DetailFormat>,
) -> String {
    let mut lines = Vec::new();
    let mut pending = Vec::new();
    push_children(nodes, visible, sort, 0, "", &mut pending);

    while let Some(Pending { index, indent, is_last }) = pending.pop() {
        let node = &nodes[index];
        let glyph = if is_last { LAST_BRANCH } else { BRANCH };

        let mut line = format!("{}{}{}", indent, glyph, node.name);
        if node.is_dir {
            line.push('/');
        } else if let Some(detail) = &detail {
            line.push_str(&detail.describe(node));
        }
        lines.push(line);

        if node.is_dir {
            let child_indent = format!("{}{}", indent, if is_last { BLANK } else { CONTINUATION });
            push_children(nodes, visible, sort, index, &child_indent, &mut pending);
        }
    }

    lines.join("\n")
}

struct Pending {
    index: usize,
    indent: String,
    is_last: bool,
}

/// Queue the sorted visible children of `parent`, first child on top
fn push_children(
    nodes: &[Node],
    visible: &[bool],
    sort: SortOptions,
    parent: usize,
    indent: &str,
    pending: &mut Vec<Pending>,
) {
    let mut children: Vec<usize> = nodes[parent]
        .children
        .iter()
        .copied()
        .filter(|&c| visible[c])
        .collect();
    children.sort_by(|&a, &b| compare(&nodes[a], &nodes[b], sort));

    let last = children.len().saturating_sub(1);
    for (position, &child) in children.iter().enumerate().rev() {
        pending.push(Pending {
            index: child,
            indent: indent.to_string(),
            is_last: position == last,
        });
    }
}
