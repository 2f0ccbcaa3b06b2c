use std::fmt;
use std::ptr;
use std::time::{Instant, SystemTime};

use tracing::{info, instrument};

use super::build::{BuildWarning, TreeBuilder};
use super::metadata::{FileType, Mode};
use super::node::{path_of, ratio, Directory, File, Node, NodeId, NodeKind, Totals};
use super::open::ArchiveOptions;
use super::order::compare_nodes;
use super::path::Path;
use super::resolve::Resolver;
use super::store::ArchiveRow;
use super::util::u64_from_usize;

/// The hierarchy of files in an archive.
///
/// The tree is built once, from every row in the archive, and never changes afterward. It's safe
/// to share between threads, and looking up paths never touches the database.
///
/// Every symbolic link in the tree is resolved while it's being built. A symlink whose target
/// doesn't exist, or whose target leads back to itself, is *broken*; that's not an error, but you
/// can check for it with [`NodeRef::is_broken`].
///
/// ```
/// use sqlarvfs::{ArchiveOptions, ArchiveRow, Tree};
///
/// let tree = Tree::build(
///     [
///         ArchiveRow::file(1, "docs/readme.txt", 42),
///         ArchiveRow::symlink(2, "readme", "docs/readme.txt"),
///     ],
///     &ArchiveOptions::new(),
/// );
///
/// let file = tree.find_path("/readme", true).unwrap();
///
/// assert_eq!(file.path().to_string(), "/docs/readme.txt");
/// assert_eq!(file.size(), 42);
/// ```
pub struct Tree {
    nodes: Vec<Node>,
    options: ArchiveOptions,
    warnings: Vec<BuildWarning>,
}

impl fmt::Debug for Tree {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes.len())
            .field("options", &self.options)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Build a tree from the rows of an archive.
    ///
    /// Rows are processed in the order they're given, which matters when more than one row has
    /// the same path; the first one wins. Problems with individual rows are never fatal; see
    /// [`Tree::warnings`].
    #[instrument(skip_all, fields(table = options.table_name()))]
    pub fn build<I>(rows: I, options: &ArchiveOptions) -> Self
    where
        I: IntoIterator<Item = ArchiveRow>,
    {
        let started = Instant::now();

        let mut builder = TreeBuilder::new(options);

        for row in rows {
            builder.insert(row);
        }

        let (mut nodes, warnings) = builder.finish();

        let broken = Resolver::new(&mut nodes, options).resolve_all();

        info!(
            nodes = nodes.len(),
            warnings = warnings.len(),
            broken_symlinks = broken,
            elapsed = ?started.elapsed(),
            "Built the file tree."
        );

        Self {
            nodes,
            options: options.clone(),
            warnings,
        }
    }

    /// The options this tree was built with.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// The problems with the archive that were found while building this tree.
    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    /// The number of files in the tree, including the root and any implicit directories.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has nothing in it but the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// The root directory.
    ///
    /// The root always exists, even for an empty archive.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn resolved(&self, id: NodeId) -> Option<NodeId> {
        match &self.get(id).kind {
            NodeKind::Symlink(symlink) => symlink.resolved,
            _ => Some(id),
        }
    }

    /// Look up the file at `path`.
    ///
    /// Symbolic links that appear as directories along the way are always followed. If
    /// `dereference` is `true` and the file at `path` is itself a symbolic link, this returns its
    /// target instead; a broken symlink then looks the same as a file that doesn't exist.
    ///
    /// This returns `None` if there is no file at `path`.
    pub fn find_path(&self, path: impl Into<Path>, dereference: bool) -> Option<NodeRef<'_>> {
        let path = path.into();
        let mut current = NodeId::ROOT;

        for segment in path.segments() {
            current = self.resolved(current)?;

            current = *self
                .get(current)
                .as_dir()?
                .index
                .get(self.options.fold(segment).as_ref())?;
        }

        if dereference {
            current = self.resolved(current)?;
        }

        Some(self.node(current))
    }

    fn totals(&self, id: NodeId) -> Totals {
        let dir = match self.get(id).as_dir() {
            Some(dir) => dir,
            None => return Totals::default(),
        };

        if let Some(totals) = dir.totals.get() {
            return *totals;
        }

        // Fill in every missing total beneath this directory in post-order, using an explicit
        // stack so that deeply nested archives can't overflow the call stack.
        let mut stack = vec![(id, false)];

        while let Some((dir_id, children_done)) = stack.pop() {
            let Some(dir) = self.get(dir_id).as_dir() else {
                continue;
            };

            if dir.totals.get().is_some() {
                continue;
            }

            if !children_done {
                stack.push((dir_id, true));

                for &child in &dir.entries {
                    if self.get(child).as_dir().is_some() {
                        stack.push((child, false));
                    }
                }

                continue;
            }

            // Another thread may have gotten here first, but it computed the same value.
            let _ = dir.totals.set(self.sum_children(dir));
        }

        dir.totals.get().copied().unwrap_or_default()
    }

    // Every child directory must already have its totals.
    fn sum_children(&self, dir: &Directory) -> Totals {
        let mut totals = Totals::default();

        for &child in &dir.entries {
            let node = self.get(child);

            let child_mtime = match &node.kind {
                NodeKind::Directory(child_dir) => {
                    let child_totals = child_dir.totals.get().copied().unwrap_or_default();

                    totals.size += child_totals.size;
                    totals.stored_size += child_totals.stored_size;

                    node.mtime.max(child_totals.latest_mtime)
                }
                NodeKind::File(file) => {
                    totals.size += file.size;
                    totals.stored_size += file.stored_size;

                    node.mtime
                }
                NodeKind::Symlink(_) | NodeKind::Other => node.mtime,
            };

            totals.latest_mtime = totals.latest_mtime.max(child_mtime);
        }

        totals
    }
}

/// A reference to a file in a [`Tree`].
///
/// This is cheap to copy.
#[derive(Clone, Copy)]
pub struct NodeRef<'tree> {
    tree: &'tree Tree,
    id: NodeId,
}

impl<'tree> fmt::Debug for NodeRef<'tree> {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", &self.path())
            .field("kind", &self.kind())
            .finish()
    }
}

impl<'tree> PartialEq for NodeRef<'tree> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'tree> Eq for NodeRef<'tree> {}

impl<'tree> NodeRef<'tree> {
    fn node(&self) -> &'tree Node {
        self.tree.get(self.id)
    }

    /// The file name, exactly as it appears in the archive.
    ///
    /// This is empty for the root.
    pub fn name(&self) -> &'tree str {
        &self.node().name
    }

    /// The absolute path of this file.
    pub fn path(&self) -> Path {
        path_of(&self.tree.nodes, self.id)
    }

    /// The directory containing this file, or `None` if this is the root.
    pub fn parent(&self) -> Option<NodeRef<'tree>> {
        self.node().parent.map(|id| self.tree.node(id))
    }

    /// The type of this file.
    pub fn kind(&self) -> FileType {
        match &self.node().kind {
            NodeKind::Directory(_) => FileType::Dir,
            NodeKind::File(_) => FileType::File,
            NodeKind::Symlink(_) => FileType::Symlink,
            NodeKind::Other => FileType::Other,
        }
    }

    /// The full Unix mode of this file.
    ///
    /// Implicit directories have the mode `drwxrwxrwx`.
    pub fn mode(&self) -> Mode {
        Mode::new(self.node().mode)
    }

    /// The time this file was last modified.
    ///
    /// Implicit directories report the latest mtime of anything beneath them.
    pub fn mtime(&self) -> Option<SystemTime> {
        if self.is_implicit() {
            self.tree.totals(self.id).latest_mtime
        } else {
            self.node().mtime
        }
    }

    /// Whether this is a directory, or a symbolic link to a directory.
    pub fn is_dir(&self) -> bool {
        match &self.node().kind {
            NodeKind::Directory(_) => true,
            NodeKind::Symlink(symlink) => symlink
                .resolved
                .map_or(false, |id| self.tree.get(id).as_dir().is_some()),
            _ => false,
        }
    }

    /// Whether this is a directory with no row of its own in the archive.
    pub fn is_implicit(&self) -> bool {
        self.node().is_implicit_dir()
    }

    /// If this is a regular file, the handle for reading it.
    pub fn as_file(&self) -> Option<&'tree File> {
        match &self.node().kind {
            NodeKind::File(file) => Some(file),
            _ => None,
        }
    }

    /// The children of this directory, in the order they appear in the archive.
    ///
    /// This is empty if this is not a directory. Symbolic links are not followed; call
    /// [`NodeRef::dereference`] first to list the target of a symlink.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'tree>> + 'tree {
        let tree = self.tree;
        let entries = self
            .node()
            .as_dir()
            .map(|dir| dir.entries.as_slice())
            .unwrap_or_default();

        entries.iter().map(move |&id| tree.node(id))
    }

    /// The children of this directory, sorted for display.
    ///
    /// Names are sorted in natural order, ignoring case. If
    /// [`ArchiveOptions::directories_first`] is set, directories come first.
    ///
    /// [`ArchiveOptions::directories_first`]: crate::ArchiveOptions::directories_first
    pub fn sorted_children(&self) -> Vec<NodeRef<'tree>> {
        let directories_first = self.tree.options.is_directories_first();

        let mut children = self.children().collect::<Vec<_>>();
        children.sort_by(|a, b| compare_nodes(a, b, directories_first));
        children
    }

    /// The child of this directory called `name`.
    ///
    /// This respects [`ArchiveOptions::case_insensitive`].
    ///
    /// [`ArchiveOptions::case_insensitive`]: crate::ArchiveOptions::case_insensitive
    pub fn child(&self, name: &str) -> Option<NodeRef<'tree>> {
        self.node()
            .as_dir()?
            .index
            .get(self.tree.options.fold(name).as_ref())
            .map(|&id| self.tree.node(id))
    }

    /// For symbolic links, the target as it was written in the archive.
    pub fn link_target(&self) -> Option<&'tree str> {
        self.node()
            .as_symlink()
            .map(|symlink| symlink.target.as_str())
    }

    /// For symbolic links, the file this symlink ultimately points to.
    ///
    /// The target is never another symlink. This returns `None` if this is not a symlink or if the
    /// symlink is broken.
    pub fn target(&self) -> Option<NodeRef<'tree>> {
        self.node()
            .as_symlink()?
            .resolved
            .map(|id| self.tree.node(id))
    }

    /// Whether this is a symbolic link that doesn't point to anything.
    ///
    /// Recursive symlinks are also broken.
    pub fn is_broken(&self) -> bool {
        self.node()
            .as_symlink()
            .map_or(false, |symlink| symlink.resolved.is_none())
    }

    /// If this is a symbolic link, return its target; otherwise return this file.
    ///
    /// This returns `None` for a broken symlink.
    pub fn dereference(&self) -> Option<NodeRef<'tree>> {
        self.tree.resolved(self.id).map(|id| self.tree.node(id))
    }

    /// The uncompressed size of this file.
    ///
    /// For a directory, this is the total size of every regular file beneath it. For a symlink,
    /// this is the length of its target.
    pub fn size(&self) -> u64 {
        match &self.node().kind {
            NodeKind::Directory(_) => self.tree.totals(self.id).size,
            NodeKind::File(file) => file.size,
            NodeKind::Symlink(symlink) => u64_from_usize(symlink.target.len()),
            NodeKind::Other => 0,
        }
    }

    /// The number of bytes this file takes up in the archive.
    ///
    /// For a directory, this is the total stored size of every regular file beneath it.
    pub fn stored_size(&self) -> u64 {
        match &self.node().kind {
            NodeKind::Directory(_) => self.tree.totals(self.id).stored_size,
            NodeKind::File(file) => file.stored_size,
            _ => self.size(),
        }
    }

    /// The stored size divided by the uncompressed size.
    ///
    /// This is `None` if the size is zero or if this is not a regular file or a directory.
    pub fn compression_ratio(&self) -> Option<f64> {
        match &self.node().kind {
            NodeKind::Directory(_) | NodeKind::File(_) => ratio(self.stored_size(), self.size()),
            _ => None,
        }
    }
}
