#![allow(dead_code)]

mod matchers;

use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use flate2::write::ZlibEncoder;
use rand::prelude::*;
use sqlarvfs::{Archive, ArchiveOptions};
use tempfile::TempDir;

#[allow(unused_imports)]
pub use matchers::*;

pub const DIR_MODE: u32 = 0x41ff;
pub const FILE_MODE: u32 = 0x81a4;
pub const SYMLINK_MODE: u32 = 0xa1ff;
pub const FIFO_MODE: u32 = 0o010644;

// The schema of the table created by the `sqlite3` command-line tool.
const SCHEMA: &str = "
    CREATE TABLE {table}(
        name TEXT PRIMARY KEY,
        mode INT,
        mtime INT,
        sz INT,
        data BLOB
    );
";

// A SQLite archive in a temporary directory, populated with raw SQL.
pub struct TestArchive {
    conn: rusqlite::Connection,
    table: String,
    path: PathBuf,
    _temp_dir: TempDir,
}

impl TestArchive {
    pub fn new() -> Self {
        Self::with_table("sqlar")
    }

    pub fn with_table(table: &str) -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.sqlar");
        let conn = rusqlite::Connection::open(&path).unwrap();
        let quoted = format!("\"{}\"", table.replace('"', "\"\""));

        conn.execute_batch(&SCHEMA.replace("{table}", &quoted))
            .unwrap();

        Self {
            conn,
            table: quoted,
            path,
            _temp_dir: temp_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row(
        &self,
        name: &str,
        mode: Option<u32>,
        mtime: Option<i64>,
        sz: i64,
        data: Option<&[u8]>,
    ) -> &Self {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (name, mode, mtime, sz, data) VALUES (?1, ?2, ?3, ?4, ?5);",
                    self.table
                ),
                (name, mode, mtime, sz, data),
            )
            .unwrap();

        self
    }

    // Run arbitrary SQL against the archive table, for rows the typed helpers can't express.
    pub fn execute(&self, sql: &str) -> &Self {
        self.conn
            .execute_batch(&sql.replace("{table}", &self.table))
            .unwrap();

        self
    }

    pub fn dir(&self, name: &str) -> &Self {
        self.row(name, Some(DIR_MODE), Some(0), 0, None)
    }

    pub fn file(&self, name: &str, data: &[u8]) -> &Self {
        self.row(name, Some(FILE_MODE), Some(0), data.len() as i64, Some(data))
    }

    pub fn compressed_file(&self, name: &str, data: &[u8]) -> &Self {
        self.row(
            name,
            Some(FILE_MODE),
            Some(0),
            data.len() as i64,
            Some(compress(data).as_slice()),
        )
    }

    // Symlink targets are stored as text, the same way the `sqlite3` command-line tool does it.
    pub fn symlink(&self, name: &str, target: &str) -> &Self {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (name, mode, mtime, sz, data) VALUES (?1, ?2, 0, ?3, ?4);",
                    self.table
                ),
                (name, SYMLINK_MODE, target.len() as i64, target),
            )
            .unwrap();

        self
    }

    pub fn open(&self) -> sqlarvfs::Result<Archive> {
        Archive::open(&self.path)
    }

    pub fn open_with(&self, opts: &ArchiveOptions) -> sqlarvfs::Result<Archive> {
        Archive::open_with(&self.path, opts)
    }
}

pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

// A buffer of bytes that can be compressed to a smaller size.
pub fn compressible_bytes() -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog "
        .iter()
        .copied()
        .cycle()
        .take(4096)
        .collect()
}

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    let mut rng = SmallRng::seed_from_u64(0);
    rng.fill_bytes(&mut buf);
    buf
}

// Names of the children of a directory, sorted for display.
pub fn sorted_names(archive: &Archive, path: &str) -> Vec<String> {
    archive
        .find_path(path, true)
        .expect("directory not found")
        .sorted_children()
        .into_iter()
        .map(|child| child.name().to_owned())
        .collect()
}

// Run the given function in a separate thread with a timeout. This is for tests where the failure
// case could result in them hanging.
pub fn with_timeout<F>(timeout: Duration, f: F) -> sqlarvfs::Result<()>
where
    F: FnOnce() -> sqlarvfs::Result<()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let result = f();
        tx.send(()).unwrap();
        result
    });

    rx.recv_timeout(timeout)
        .unwrap_or_else(|_| panic!("test timed out after {} seconds", timeout.as_secs()));

    handle.join().unwrap()
}
