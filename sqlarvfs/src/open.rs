use std::borrow::Cow;
use std::path::Path;

use rusqlite::OpenFlags;

/// The name of the table SQLite archives use by default.
pub const DEFAULT_TABLE: &str = "sqlar";

/// Options for opening an [`Archive`] and building its [`Tree`].
///
/// These are fixed for the lifetime of the tree; changing them means opening the archive again.
///
/// ```
/// use sqlarvfs::ArchiveOptions;
///
/// let opts = ArchiveOptions::new()
///     .table("files")
///     .case_insensitive(true)
///     .directories_first(false);
///
/// assert_eq!(opts.table_name(), "files");
/// assert!(opts.is_case_insensitive());
/// ```
///
/// [`Archive`]: crate::Archive
/// [`Tree`]: crate::Tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    table: String,
    case_insensitive: bool,
    directories_first: bool,
}

impl Default for ArchiveOptions {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveOptions {
    /// Create a new [`ArchiveOptions`] with default settings.
    pub fn new() -> Self {
        Self {
            table: String::from(DEFAULT_TABLE),
            case_insensitive: false,
            directories_first: true,
        }
    }

    /// The name of the table to read the archive from.
    ///
    /// The table must have the same schema as the standard `sqlar` table.
    ///
    /// The default is `sqlar`.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Compare file names case-insensitively when looking them up.
    ///
    /// Names keep the case they have in the archive. Two names that differ only by case are
    /// considered the same file, and the one that appears later in the archive is dropped.
    ///
    /// The default is `false`.
    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Sort directories before other files when listing a directory.
    ///
    /// The default is `true`.
    pub fn directories_first(mut self, directories_first: bool) -> Self {
        self.directories_first = directories_first;
        self
    }

    /// The name of the archive table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Whether names are compared case-insensitively.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Whether directories are sorted before other files.
    pub fn is_directories_first(&self) -> bool {
        self.directories_first
    }

    // The key a name is stored under in a directory's child index.
    pub(crate) fn fold<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.case_insensitive {
            Cow::Owned(name.to_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.table.is_empty() {
            return Err(crate::Error::InvalidArgs {
                reason: String::from("`ArchiveOptions::table` cannot be empty."),
            });
        }

        Ok(())
    }
}

// Open a read-only connection to the database at `path`.
pub(crate) fn open_connection(
    path: &Path,
    opts: &ArchiveOptions,
) -> crate::Result<rusqlite::Connection> {
    opts.validate()?;

    // SQLITE_OPEN_NO_MUTEX is the default in rusqlite. Its docs explain why.
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    Ok(rusqlite::Connection::open_with_flags(path, flags)?)
}
