use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::blob::Blob;
use rusqlite::types::ValueRef;
use rusqlite::OptionalExtension;
use tracing::warn;

use super::metadata::{DIR_MODE, FILE_MODE, SYMLINK_MODE, TYPE_MASK};
use super::util::{size_from_sql, u64_from_usize};

/// A single row of the archive table, minus the file contents.
///
/// This is the input to [`Tree::build`]. Rows are usually read from the archive by
/// [`Archive::open`], but you can also construct them yourself.
///
/// [`Tree::build`]: crate::Tree::build
/// [`Archive::open`]: crate::Archive::open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRow {
    /// The SQLite rowid, used to open the blob later.
    pub row_id: i64,

    /// The `name` column, exactly as it appears in the archive.
    pub name: String,

    /// The full Unix mode, including the file type bits.
    pub mode: u32,

    /// The mtime, if the archive has one.
    pub mtime: Option<SystemTime>,

    /// The `sz` column: the uncompressed size of the file.
    pub size: u64,

    /// The length of the `data` column as stored, which is smaller than `size` if the data is
    /// compressed.
    pub stored_size: u64,

    /// For symbolic links, the link target.
    pub link_target: Option<String>,
}

impl ArchiveRow {
    /// A directory row with `rwxrwxrwx` permissions.
    pub fn dir(row_id: i64, name: impl Into<String>) -> Self {
        Self {
            row_id,
            name: name.into(),
            mode: DIR_MODE | 0o777,
            mtime: None,
            size: 0,
            stored_size: 0,
            link_target: None,
        }
    }

    /// A regular file row with `rw-r--r--` permissions whose data is stored uncompressed.
    pub fn file(row_id: i64, name: impl Into<String>, size: u64) -> Self {
        Self {
            row_id,
            name: name.into(),
            mode: FILE_MODE | 0o644,
            mtime: None,
            size,
            stored_size: size,
            link_target: None,
        }
    }

    /// A symbolic link row pointing to `target`.
    pub fn symlink(row_id: i64, name: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();

        Self {
            row_id,
            name: name.into(),
            mode: SYMLINK_MODE | 0o777,
            mtime: None,
            size: u64_from_usize(target.len()),
            stored_size: u64_from_usize(target.len()),
            link_target: Some(target),
        }
    }

    /// Set the full Unix mode of this row.
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Set the mtime of this row.
    pub fn with_mtime(mut self, mtime: SystemTime) -> Self {
        self.mtime = Some(mtime);
        self
    }
}

pub struct FileBlob<'conn> {
    blob: Blob<'conn>,
    original_size: u64,
}

impl<'conn> FileBlob<'conn> {
    // Whether the data is compressed is decided only by its length, never by its contents.
    pub fn is_compressed(&self) -> bool {
        u64_from_usize(self.blob.len()) != self.original_size
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn into_blob(self) -> Blob<'conn> {
        self.blob
    }
}

fn mtime_from_unix(secs: i64) -> Option<SystemTime> {
    if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(secs.unsigned_abs()))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
    }
}

// Quote a table name for use as an SQL identifier.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// Methods on this type map 1:1 to SQL queries. rusqlite errors are handled and converted to
// sqlarvfs errors.
#[derive(Debug)]
pub struct Store<'conn> {
    conn: &'conn rusqlite::Connection,
    table: &'conn str,
}

impl<'conn> Store<'conn> {
    pub fn new(conn: &'conn rusqlite::Connection, table: &'conn str) -> Self {
        Self { conn, table }
    }

    pub fn table_exists(&self) -> crate::Result<bool> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_schema WHERE type = 'table' AND name = ?1;",
                (self.table,),
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    // Read every row in the archive in table order, without reading file contents.
    pub fn for_each_row<F>(&self, mut f: F) -> crate::Result<()>
    where
        F: FnMut(ArchiveRow),
    {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT
                rowid,
                name,
                mode,
                mtime,
                sz,
                length(CAST(data AS BLOB)),
                data IS NULL AS is_null,
                iif(mode & ?1 = ?2, CAST(data AS BLOB), NULL) AS target
            FROM
                {}
            ORDER BY
                rowid ASC;
            ",
            quote_ident(self.table)
        ))?;

        let mut rows = stmt.query((TYPE_MASK, SYMLINK_MODE))?;

        while let Some(row) = rows.next()? {
            let row_id: i64 = row.get(0)?;

            // A single malformed row shouldn't make the whole archive unreadable.
            let name = match row.get_ref(1)? {
                ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                    Ok(name) => name.to_owned(),
                    Err(_) => {
                        warn!(row_id, "Skipping a row whose name is not valid UTF-8.");
                        continue;
                    }
                },
                _ => {
                    warn!(row_id, "Skipping a row whose name is missing or not text.");
                    continue;
                }
            };

            let mode = match row.get::<_, Option<i64>>(2) {
                Ok(mode) => match mode.map(u32::try_from).transpose() {
                    Ok(mode) => mode,
                    Err(_) => {
                        warn!(row_id, path = %name, "Skipping a row with an out-of-range mode.");
                        continue;
                    }
                },
                Err(_) => {
                    warn!(row_id, path = %name, "Skipping a row whose mode is not an integer.");
                    continue;
                }
            };

            let mtime: Option<i64> = row.get(3)?;
            let size: Option<i64> = row.get(4)?;
            let stored_size: Option<i64> = row.get(5)?;
            let is_null: bool = row.get(6)?;
            let target: Option<Vec<u8>> = row.get(7)?;

            // The mode column is nullable. Without one, the best we can do is guess whether this
            // is a directory the same way other sqlar implementations do: a NULL blob.
            let mode = mode.unwrap_or(if is_null {
                DIR_MODE | 0o755
            } else {
                FILE_MODE | 0o644
            });

            let link_target = target.map(|bytes| match String::from_utf8(bytes) {
                Ok(target) => target,
                Err(err) => {
                    warn!(
                        path = %name,
                        "Symbolic link target is not valid UTF-8; replacing invalid bytes."
                    );
                    String::from_utf8_lossy(err.as_bytes()).into_owned()
                }
            });

            f(ArchiveRow {
                row_id,
                mtime: mtime.and_then(mtime_from_unix),
                // Symbolic links created by some tools have a negative size.
                size: size_from_sql(size),
                stored_size: size_from_sql(stored_size),
                name,
                mode,
                link_target,
            });
        }

        Ok(())
    }

    pub fn open_blob(&self, row_id: i64, original_size: u64) -> crate::Result<FileBlob<'conn>> {
        Ok(FileBlob {
            blob: self.conn.blob_open(
                rusqlite::DatabaseName::Main,
                self.table,
                "data",
                row_id,
                true,
            )?,
            original_size,
        })
    }
}
