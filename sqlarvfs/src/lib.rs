//! A read-only virtual filesystem over a SQLite archive.
//!
//! This library presents the contents of a [sqlar](https://sqlite.org/sqlar.html) archive as a
//! hierarchy of directories, regular files, and symbolic links.
//!
//! A SQLite archive stores each file as a row with a flat path, so the hierarchy has to be
//! inferred. When an archive is opened, every row is read once and assembled into a [`Tree`].
//! Directories that only exist because some file beneath them does are created implicitly, and
//! every symbolic link is resolved to its final target. From then on, the tree never changes, and
//! it can be shared freely between threads.
//!
//! ```no_run
//! use std::io::prelude::*;
//!
//! use sqlarvfs::{Archive, ArchiveOptions};
//!
//! fn main() -> sqlarvfs::Result<()> {
//!     let opts = ArchiveOptions::new().case_insensitive(true);
//!     let archive = Archive::open_with("archive.sqlar", &opts)?;
//!
//!     let dir = archive.find_path("/path/to", true).unwrap();
//!
//!     for child in dir.sorted_children() {
//!         println!("{}", child.name());
//!     }
//!
//!     let mut contents = String::new();
//!     let mut reader = archive.open_path("/path/to/file")?;
//!
//!     reader.read_to_string(&mut contents)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! To open a SQLite archive, use [`Archive::open`]. You can look up files with
//! [`Archive::find_path`] and read them with [`Archive::reader`] or [`Archive::open_path`].

// This requires the nightly toolchain.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod archive;
mod build;
mod error;
mod metadata;
mod node;
mod open;
mod order;
mod path;
mod resolve;
mod store;
mod stream;
mod tree;
mod util;

pub use archive::Archive;
pub use build::BuildWarning;
pub use error::{Error, Result, SqliteErrorCode};
pub use metadata::{FileMode, FileType, Mode};
pub use node::File;
pub use open::{ArchiveOptions, DEFAULT_TABLE};
pub use order::natural_cmp;
pub use path::Path;
pub use store::ArchiveRow;
pub use stream::FileReader;
pub use tree::{NodeRef, Tree};
