use std::fmt;

use tracing::warn;

use super::metadata::FileType;
use super::node::{Directory, File, Node, NodeId, NodeKind, ResolveState, Symlink};
use super::open::ArchiveOptions;
use super::path::Path;
use super::store::ArchiveRow;

/// A problem with the archive that was skipped over while building a [`Tree`].
///
/// None of these stop the tree from being built; the offending row is dropped and the rest of the
/// archive is still available. They're logged as they happen and collected in
/// [`Tree::warnings`].
///
/// [`Tree`]: crate::Tree
/// [`Tree::warnings`]: crate::Tree::warnings
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildWarning {
    /// More than one row has the same path. The first one was kept.
    ///
    /// In a case-insensitive tree, paths that differ only by case are the same path.
    DuplicatePath {
        /// The path of the dropped row.
        path: Path,

        /// The rowid of the dropped row.
        row_id: i64,
    },

    /// One of the ancestors of this row is not a directory, so the row has nowhere to go.
    AncestorNotADirectory {
        /// The path of the dropped row.
        path: Path,

        /// The ancestor which is not a directory.
        ancestor: Path,

        /// The rowid of the dropped row.
        row_id: i64,
    },
}

impl fmt::Display for BuildWarning {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePath { path, .. } => {
                write!(f, "This path appears in the archive more than once: {path}")
            }
            Self::AncestorNotADirectory { path, ancestor, .. } => write!(
                f,
                "An ancestor of this path is not a directory: {path} (ancestor: {ancestor})"
            ),
        }
    }
}

// Materializes the node graph from archive rows, one row at a time, in table order.
#[derive(Debug)]
pub(crate) struct TreeBuilder<'a> {
    nodes: Vec<Node>,
    options: &'a ArchiveOptions,
    warnings: Vec<BuildWarning>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(options: &'a ArchiveOptions) -> Self {
        Self {
            nodes: vec![Node::root()],
            options,
            warnings: Vec::new(),
        }
    }

    fn child_of(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[parent.index()]
            .as_dir()?
            .index
            .get(self.options.fold(name).as_ref())
            .copied()
    }

    fn push(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let key = self.options.fold(&node.name).into_owned();

        self.nodes.push(node);

        if let Some(dir) = self.nodes[parent.index()].as_dir_mut() {
            dir.entries.push(id);
            dir.index.insert(key, id);
        }

        id
    }

    pub fn insert(&mut self, row: ArchiveRow) {
        let path = Path::new(&row.name);

        // The archive may have an entry for the root itself, but we already have one.
        let Some(name) = path.base_name() else {
            return;
        };

        let mut parent = NodeId::ROOT;

        for (depth, segment) in path.segments().take(path.depth() - 1).enumerate() {
            parent = match self.child_of(parent, segment) {
                Some(id) if self.nodes[id.index()].as_dir().is_some() => id,
                Some(_) => {
                    let ancestor = path
                        .segments()
                        .take(depth + 1)
                        .fold(Path::root(), |ancestor, segment| ancestor.child(segment));

                    warn!(
                        path = %path,
                        ancestor = %ancestor,
                        "Skipping a file whose ancestor is not a directory."
                    );

                    self.warnings.push(BuildWarning::AncestorNotADirectory {
                        path: path.clone(),
                        ancestor,
                        row_id: row.row_id,
                    });

                    return;
                }
                None => self.push(parent, Node::implicit_dir(segment, parent)),
            };
        }

        let file_type = FileType::from_mode(row.mode);

        match self.child_of(parent, name) {
            None => {
                let node = node_from_row(name, parent, row);
                self.push(parent, node);
            }
            Some(id)
                if file_type == FileType::Dir && self.nodes[id.index()].is_implicit_dir() =>
            {
                let node = &mut self.nodes[id.index()];

                node.name = name.to_owned();
                node.mode = row.mode;
                node.mtime = row.mtime;

                if let Some(dir) = node.as_dir_mut() {
                    dir.implicit = false;
                }
            }
            Some(_) => {
                warn!(path = %path, "Skipping a duplicate path in the archive.");

                self.warnings.push(BuildWarning::DuplicatePath {
                    path: path.clone(),
                    row_id: row.row_id,
                });
            }
        }
    }

    pub fn finish(self) -> (Vec<Node>, Vec<BuildWarning>) {
        (self.nodes, self.warnings)
    }
}

fn node_from_row(name: &str, parent: NodeId, row: ArchiveRow) -> Node {
    let kind = match FileType::from_mode(row.mode) {
        FileType::Dir => NodeKind::Directory(Directory::default()),
        FileType::File => NodeKind::File(File {
            row_id: row.row_id,
            size: row.size,
            stored_size: row.stored_size,
        }),
        FileType::Symlink => match row.link_target {
            Some(target) => NodeKind::Symlink(Symlink {
                target,
                resolved: None,
                state: ResolveState::NotResolved,
            }),
            // A symlink without a target can never resolve.
            None => NodeKind::Symlink(Symlink {
                target: String::new(),
                resolved: None,
                state: ResolveState::Resolved,
            }),
        },
        FileType::Other => NodeKind::Other,
    };

    Node {
        name: name.to_owned(),
        parent: Some(parent),
        mode: row.mode,
        mtime: row.mtime,
        kind,
    }
}
