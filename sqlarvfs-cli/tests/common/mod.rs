#![allow(dead_code)]

use std::path::PathBuf;

use clap::Parser;
use rusqlite::{params, Connection};
use sqlarvfs_cli::Cli;
use tempfile::TempDir;

pub const DIR_MODE: u32 = 0o040755;
pub const FILE_MODE: u32 = 0o100644;
pub const SYMLINK_MODE: u32 = 0o120777;

// 2024-05-15T07:51:19Z
pub const MTIME: i64 = 1_715_759_479;

pub fn command(args: &[&str]) -> eyre::Result<String> {
    let mut output = Vec::new();
    let mut all_args = vec!["sqlarvfs"];

    all_args.extend_from_slice(args);
    Cli::parse_from(all_args).dispatch(&mut output)?;

    Ok(String::from_utf8(output)?.trim_end().to_owned())
}

/// A throwaway archive written with plain SQL.
pub struct TestArchive {
    dir: TempDir,
    conn: Connection,
}

impl TestArchive {
    pub fn new() -> eyre::Result<Self> {
        let dir = tempfile::tempdir()?;
        let conn = Connection::open(dir.path().join("test.sqlar"))?;

        conn.execute_batch(
            "CREATE TABLE sqlar(
                name TEXT PRIMARY KEY,
                mode INT,
                mtime INT,
                sz INT,
                data BLOB
            );",
        )?;

        Ok(Self { dir, conn })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("test.sqlar")
    }

    pub fn path_str(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    fn insert(&self, name: &str, mode: u32, sz: i64, data: Option<&[u8]>) -> eyre::Result<&Self> {
        self.conn.execute(
            "INSERT INTO sqlar (name, mode, mtime, sz, data) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, mode, MTIME, sz, data],
        )?;

        Ok(self)
    }

    pub fn dir(&self, name: &str) -> eyre::Result<&Self> {
        self.insert(name, DIR_MODE, 0, None)
    }

    pub fn file(&self, name: &str, data: &[u8]) -> eyre::Result<&Self> {
        self.insert(name, FILE_MODE, data.len() as i64, Some(data))
    }

    pub fn symlink(&self, name: &str, target: &str) -> eyre::Result<&Self> {
        self.insert(name, SYMLINK_MODE, -1, Some(target.as_bytes()))
    }
}
