use std::io::{Seek, SeekFrom};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use tracing::instrument;

use super::metadata::FileType;
use super::node::File;
use super::open::{open_connection, ArchiveOptions};
use super::path::Path;
use super::store::Store;
use super::stream::FileReader;
use super::tree::{NodeRef, Tree};

/// A read-only SQLite archive.
///
/// Opening an archive reads every row in its table (but not the file contents) and builds a
/// [`Tree`] from them. Looking up files happens entirely in memory; only reading a file's
/// contents goes back to the database.
///
/// An `Archive` owns a single SQLite connection, so it can't be shared between threads. To read
/// from the same archive on another thread, use [`Archive::try_clone`], which opens a new
/// connection but shares the tree.
///
/// ```no_run
/// use std::io::Read;
///
/// use sqlarvfs::Archive;
///
/// fn main() -> sqlarvfs::Result<()> {
///     let archive = Archive::open("archive.sqlar")?;
///
///     let mut contents = String::new();
///     archive.open_path("/path/to/file")?.read_to_string(&mut contents)?;
///
///     for child in archive.tree().root().sorted_children() {
///         println!("{}", child.name());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Archive {
    conn: rusqlite::Connection,
    tree: Arc<Tree>,
    db_path: PathBuf,
}

impl Archive {
    /// Open the SQLite archive at `path` with the default options.
    ///
    /// This is the same as [`Archive::open_with`], but using the default options.
    pub fn open<P: AsRef<FsPath>>(path: P) -> crate::Result<Self> {
        Self::open_with(path, &ArchiveOptions::new())
    }

    /// Open the SQLite archive at `path`.
    ///
    /// The database is always opened read-only.
    ///
    /// # Errors
    ///
    /// - [`InvalidArgs`]: The options are invalid, or the database has no table with the name
    /// given by [`ArchiveOptions::table`].
    /// - [`Sqlite`]: The database could not be opened or read, such as because it does not exist
    /// or is not a SQLite database.
    ///
    /// [`InvalidArgs`]: crate::Error::InvalidArgs
    /// [`Sqlite`]: crate::Error::Sqlite
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with<P: AsRef<FsPath>>(path: P, opts: &ArchiveOptions) -> crate::Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let conn = open_connection(&db_path, opts)?;

        let mut rows = Vec::new();

        {
            let store = Store::new(&conn, opts.table_name());

            if !store.table_exists()? {
                return Err(crate::Error::InvalidArgs {
                    reason: format!(
                        "This database has no table named `{}`.",
                        opts.table_name()
                    ),
                });
            }

            store.for_each_row(|row| rows.push(row))?;
        }

        Ok(Self {
            conn,
            tree: Arc::new(Tree::build(rows, opts)),
            db_path,
        })
    }

    /// Open another handle to this archive.
    ///
    /// The new handle has its own database connection, so it can be sent to another thread, but it
    /// shares the same [`Tree`] rather than building it again.
    pub fn try_clone(&self) -> crate::Result<Self> {
        Ok(Self {
            conn: open_connection(&self.db_path, self.tree.options())?,
            tree: Arc::clone(&self.tree),
            db_path: self.db_path.clone(),
        })
    }

    /// The tree of files in this archive.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// A shared handle to the tree of files in this archive.
    ///
    /// The tree outlives the archive, so this can be used to look up files without holding a
    /// database connection.
    pub fn shared_tree(&self) -> Arc<Tree> {
        Arc::clone(&self.tree)
    }

    /// Look up the file at `path`.
    ///
    /// See [`Tree::find_path`].
    pub fn find_path(&self, path: impl Into<Path>, dereference: bool) -> Option<NodeRef<'_>> {
        self.tree.find_path(path, dereference)
    }

    fn store(&self) -> Store<'_> {
        Store::new(&self.conn, self.tree.options().table_name())
    }

    /// Open a reader over the contents of `file`.
    ///
    /// If the file is compressed, it's decompressed as it's read.
    ///
    /// # Errors
    ///
    /// - [`CompressionNotSupported`]: The file is compressed, and sqlarvfs was compiled without
    /// compression support.
    /// - [`Sqlite`]: The row for this file no longer exists, or the database could not be read.
    ///
    /// [`CompressionNotSupported`]: crate::Error::CompressionNotSupported
    /// [`Sqlite`]: crate::Error::Sqlite
    pub fn reader(&self, file: &File) -> crate::Result<FileReader<'_>> {
        let blob = self.store().open_blob(file.row_id, file.size)?;

        FileReader::new(blob)
    }

    /// Open a reader over the contents of `file`, starting at `offset` bytes in.
    ///
    /// For a compressed file, this has to decompress and discard everything before `offset`.
    pub fn reader_at(&self, file: &File, offset: u64) -> crate::Result<FileReader<'_>> {
        let mut reader = self.reader(file)?;

        if offset > 0 {
            reader.seek(SeekFrom::Start(offset))?;
        }

        Ok(reader)
    }

    /// Open a reader over the contents of the regular file at `path`, following symbolic links.
    ///
    /// # Errors
    ///
    /// - [`FileNotFound`]: There is no file at `path`.
    /// - [`BrokenSymlink`]: The file at `path` is a symbolic link that is broken or recursive.
    /// - [`NotARegularFile`]: The file at `path` is a directory.
    /// - [`UnsupportedFileType`]: The file at `path` is a special file, like a pipe or a device.
    ///
    /// This can also return any of the errors from [`Archive::reader`].
    ///
    /// [`FileNotFound`]: crate::Error::FileNotFound
    /// [`BrokenSymlink`]: crate::Error::BrokenSymlink
    /// [`NotARegularFile`]: crate::Error::NotARegularFile
    /// [`UnsupportedFileType`]: crate::Error::UnsupportedFileType
    pub fn open_path(&self, path: impl Into<Path>) -> crate::Result<FileReader<'_>> {
        let path = path.into();
        let node = self.find_dereferenced(&path)?;

        match node.as_file() {
            Some(file) => self.reader(file),
            None if node.kind() == FileType::Other => Err(crate::Error::UnsupportedFileType {
                path: path.to_string(),
            }),
            None => Err(crate::Error::NotARegularFile {
                path: path.to_string(),
            }),
        }
    }

    /// List the directory at `path`, following symbolic links.
    ///
    /// The children are sorted the same way as [`NodeRef::sorted_children`].
    ///
    /// # Errors
    ///
    /// - [`FileNotFound`]: There is no file at `path`.
    /// - [`BrokenSymlink`]: The file at `path` is a symbolic link that is broken or recursive.
    /// - [`NotADirectory`]: The file at `path` is not a directory.
    ///
    /// [`FileNotFound`]: crate::Error::FileNotFound
    /// [`BrokenSymlink`]: crate::Error::BrokenSymlink
    /// [`NotADirectory`]: crate::Error::NotADirectory
    pub fn read_dir(&self, path: impl Into<Path>) -> crate::Result<Vec<NodeRef<'_>>> {
        let path = path.into();
        let node = self.find_dereferenced(&path)?;

        if node.kind() != FileType::Dir {
            return Err(crate::Error::NotADirectory {
                path: path.to_string(),
            });
        }

        Ok(node.sorted_children())
    }

    fn find_dereferenced(&self, path: &Path) -> crate::Result<NodeRef<'_>> {
        let node = self
            .tree
            .find_path(path, false)
            .ok_or_else(|| crate::Error::FileNotFound {
                path: path.to_string(),
            })?;

        node.dereference().ok_or_else(|| crate::Error::BrokenSymlink {
            path: path.to_string(),
        })
    }
}
