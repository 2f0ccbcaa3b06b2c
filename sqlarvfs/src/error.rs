use std::fmt;
use std::io;
use std::result;

use thiserror::Error;

/// An opaque type representing a SQLite error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteErrorCode {
    extended_code: std::ffi::c_int,
}

impl fmt::Display for SqliteErrorCode {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        rusqlite::ffi::Error::new(self.extended_code).fmt(f)
    }
}

impl SqliteErrorCode {
    /// The raw extended error code from the SQLite C API.
    ///
    /// See the [SQLite docs](https://www.sqlite.org/rescode.html) for more information.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub fn raw_code(&self) -> std::ffi::c_int {
        // We're not including rusqlite in our public API, so we're only exposing the raw error
        // code from the SQLite C API as opposed to any rusqlite types.
        self.extended_code
    }
}

/// The error type for sqlarvfs.
///
/// Looking up a path that doesn't exist is not an error; [`Tree::find_path`] returns `None`.
/// Likewise, a broken or recursive symbolic link is a property of the archive, not an error, until
/// somebody tries to read through it.
///
/// This type can be converted [`From`] an [`std::io::Error`]. If the value the [`std::io::Error`]
/// wraps can be downcast into a [`sqlarvfs::Error`], it will be. Otherwise, it will be converted
/// into a new [`sqlarvfs::Error::Io`].
///
/// [`Tree::find_path`]: crate::Tree::find_path
/// [`sqlarvfs::Error`]: crate::Error
/// [`sqlarvfs::Error::Io`]: crate::Error::Io
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("Some arguments were invalid: {reason}")]
    InvalidArgs { reason: String },

    #[error("This file was not found: {path}")]
    FileNotFound { path: String },

    #[error("This file is a directory or some other kind of file, when we were expecting a regular file: {path}")]
    NotARegularFile { path: String },

    #[error("A file is not a directory, when we were expecting one: {path}")]
    NotADirectory { path: String },

    #[error("This symbolic link is broken or recursive: {path}")]
    BrokenSymlink { path: String },

    #[error("This file is a special file (like a pipe or a device), which is not supported: {path}")]
    UnsupportedFileType { path: String },

    #[error("Attempted to read a compressed file, but sqlarvfs was compiled without compression support.")]
    CompressionNotSupported,

    #[error("There was an error from the underlying SQLite database: {code:?}")]
    Sqlite {
        /// The underlying SQLite error code, if there is one.
        code: Option<SqliteErrorCode>,
    },

    #[error("An I/O error occurred: {kind}")]
    Io {
        /// The [`std::io::ErrorKind`] of the I/O error.
        kind: io::ErrorKind,
    },
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        let kind = error.kind();
        match error.into_inner() {
            Some(payload) => match payload.downcast::<Error>() {
                Ok(crate_error) => *crate_error,
                Err(_) => Error::Io { kind },
            },
            None => Error::Io { kind },
        }
    }
}

impl From<Error> for io::Error {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn from(err: Error) -> Self {
        // Don't use a default match arm here. We want to be explicit about how we're mapping
        // `Error` variants to `io::ErrorKind` variants and make sure we remember to update this
        // when we add new ones.
        let kind = match err {
            Error::InvalidArgs { .. } => io::ErrorKind::InvalidInput,
            Error::FileNotFound { .. } => io::ErrorKind::NotFound,
            Error::NotARegularFile { .. } => io::ErrorKind::Other,
            // When it's stable, we can use `std::io::ErrorKind::NotADirectory`.
            Error::NotADirectory { .. } => io::ErrorKind::Other,
            Error::BrokenSymlink { .. } => io::ErrorKind::NotFound,
            Error::UnsupportedFileType { .. } => io::ErrorKind::Unsupported,
            Error::CompressionNotSupported => io::ErrorKind::Unsupported,
            Error::Sqlite { .. } => io::ErrorKind::Other,
            Error::Io { kind } => kind,
        };

        io::Error::new(kind, err)
    }
}

impl From<rusqlite::Error> for Error {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite {
            code: err.sqlite_error().map(|code| SqliteErrorCode {
                extended_code: code.extended_code,
            }),
        }
    }
}

/// The result type for sqlarvfs.
pub type Result<T> = result::Result<T, Error>;
