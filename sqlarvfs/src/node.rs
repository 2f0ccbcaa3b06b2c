use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::SystemTime;

use super::metadata::IMPLICIT_DIR_MODE;
use super::path::Path;

/// A stable index into the node arena of a [`Tree`].
///
/// [`Tree`]: crate::Tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub const ROOT: Self = Self(0);

    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A regular file in the archive.
///
/// This is a cheap handle that identifies the row holding the file's contents. Pass it to
/// [`Archive::reader`] to read them.
///
/// [`Archive::reader`]: crate::Archive::reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct File {
    pub(crate) row_id: i64,
    pub(crate) size: u64,
    pub(crate) stored_size: u64,
}

impl File {
    /// The uncompressed size of the file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The number of bytes the file takes up in the archive.
    pub fn stored_size(&self) -> u64 {
        self.stored_size
    }

    /// Whether the file is stored compressed.
    ///
    /// This is decided only by comparing the stored size to the uncompressed size.
    pub fn is_compressed(&self) -> bool {
        self.stored_size != self.size
    }

    /// The stored size divided by the uncompressed size, or `None` if the file is empty.
    pub fn compression_ratio(&self) -> Option<f64> {
        ratio(self.stored_size, self.size)
    }
}

pub(crate) fn ratio(stored_size: u64, size: u64) -> Option<f64> {
    if size == 0 {
        None
    } else {
        Some(stored_size as f64 / size as f64)
    }
}

/// Aggregates over every regular file beneath a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Totals {
    pub size: u64,
    pub stored_size: u64,
    pub latest_mtime: Option<SystemTime>,
}

#[derive(Debug, Default)]
pub(crate) struct Directory {
    // Children in the order their rows appeared in the archive.
    pub entries: Vec<NodeId>,

    // Keyed by the folded name, so lookups honor the tree-wide case policy.
    pub index: HashMap<String, NodeId>,

    pub implicit: bool,

    // Must not be initialized until the tree is fully built.
    pub totals: OnceLock<Totals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveState {
    NotResolved,
    InProgress,
    Resolved,
}

#[derive(Debug)]
pub(crate) struct Symlink {
    pub target: String,

    // Never points to another symlink.
    pub resolved: Option<NodeId>,

    pub state: ResolveState,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Directory(Directory),
    File(File),
    Symlink(Symlink),
    Other,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub mode: u32,
    pub mtime: Option<SystemTime>,
    pub kind: NodeKind,
}

impl Node {
    pub fn root() -> Self {
        Self {
            name: String::new(),
            parent: None,
            mode: IMPLICIT_DIR_MODE,
            mtime: None,
            kind: NodeKind::Directory(Directory {
                implicit: true,
                ..Default::default()
            }),
        }
    }

    pub fn implicit_dir(name: &str, parent: NodeId) -> Self {
        Self {
            name: name.to_owned(),
            parent: Some(parent),
            mode: IMPLICIT_DIR_MODE,
            mtime: None,
            kind: NodeKind::Directory(Directory {
                implicit: true,
                ..Default::default()
            }),
        }
    }

    pub fn as_dir(&self) -> Option<&Directory> {
        match &self.kind {
            NodeKind::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_dir_mut(&mut self) -> Option<&mut Directory> {
        match &mut self.kind {
            NodeKind::Directory(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn as_symlink(&self) -> Option<&Symlink> {
        match &self.kind {
            NodeKind::Symlink(symlink) => Some(symlink),
            _ => None,
        }
    }

    pub fn as_symlink_mut(&mut self) -> Option<&mut Symlink> {
        match &mut self.kind {
            NodeKind::Symlink(symlink) => Some(symlink),
            _ => None,
        }
    }

    pub fn is_implicit_dir(&self) -> bool {
        matches!(&self.kind, NodeKind::Directory(dir) if dir.implicit)
    }
}

// Reconstruct the absolute path of a node by walking its parents.
pub(crate) fn path_of(nodes: &[Node], id: NodeId) -> Path {
    let mut names = Vec::new();
    let mut current = Some(id);

    while let Some(id) = current {
        let node = &nodes[id.index()];

        if node.parent.is_some() {
            names.push(node.name.as_str());
        }

        current = node.parent;
    }

    names
        .into_iter()
        .rev()
        .fold(Path::root(), |path, name| path.child(name))
}

#[cfg(test)]
mod tests {
    use xpct::{be_false, be_none, be_some, be_true, equal, expect};

    use super::*;

    #[test]
    fn file_compression_is_decided_by_length() {
        let raw = File {
            row_id: 1,
            size: 64,
            stored_size: 64,
        };

        let compressed = File {
            row_id: 2,
            size: 64,
            stored_size: 16,
        };

        expect!(raw.is_compressed()).to(be_false());
        expect!(compressed.is_compressed()).to(be_true());
        expect!(compressed.compression_ratio()).to(equal(Some(0.25)));
    }

    #[test]
    fn empty_files_have_no_compression_ratio() {
        expect!(ratio(0, 0)).to(be_none());
        expect!(ratio(10, 5)).to(be_some());
    }

    #[test]
    fn new_directories_are_implicit() {
        let root = Node::root();
        let dir = Node::implicit_dir("dir", NodeId::ROOT);

        expect!(root.is_implicit_dir()).to(be_true());
        expect!(dir.is_implicit_dir()).to(be_true());
        expect!(dir.parent).to(equal(Some(NodeId::ROOT)));
    }
}
