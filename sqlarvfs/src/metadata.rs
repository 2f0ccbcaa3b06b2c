use std::fmt;

use bitflags::bitflags;

// https://github.com/torvalds/linux/blob/master/include/uapi/linux/stat.h
pub(crate) const TYPE_MASK: u32 = 0o170000;
pub(crate) const FILE_MODE: u32 = 0o100000;
pub(crate) const DIR_MODE: u32 = 0o040000;
pub(crate) const SYMLINK_MODE: u32 = 0o120000;

// The mode given to directories that only exist because some descendant needs them.
pub(crate) const IMPLICIT_DIR_MODE: u32 = DIR_MODE | 0o777;

bitflags! {
    /// The permission bits of a file mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileMode: u32 {
        /// Read for owner (`S_IRUSR`).
        const OWNER_R = 0o0400;

        /// Write for owner (`S_IWUSR`).
        const OWNER_W = 0o0200;

        /// Execute for owner (`S_IXUSR`).
        const OWNER_X = 0o0100;

        /// Read, write, and execute for owner (`S_IRWXU`).
        const OWNER_RWX = 0o0700;

        /// Read for group (`S_IRGRP`).
        const GROUP_R = 0o0040;

        /// Write for group (`S_IWGRP`).
        const GROUP_W = 0o0020;

        /// Execute for group (`S_IXGRP`).
        const GROUP_X = 0o0010;

        /// Read, write, and execute for group (`S_IRWXG`).
        const GROUP_RWX = 0o0070;

        /// Read for others (`S_IROTH`).
        const OTHER_R = 0o0004;

        /// Write for others (`S_IWOTH`).
        const OTHER_W = 0o0002;

        /// Execute for others (`S_IXOTH`).
        const OTHER_X = 0o0001;

        /// Read, write, and execute for others (`S_IRWXO`).
        const OTHER_RWX = 0o0007;

        /// Set user ID on execution (`S_ISUID`).
        const SUID = 0o4000;

        /// Set group ID on execution (`S_ISGID`).
        const SGID = 0o2000;

        /// The sticky bit (`S_ISVTX`).
        const STICKY = 0o1000;
    }
}

impl FileMode {
    /// Extract the permission bits from a full Unix `mode`, discarding the file type bits.
    pub fn from_mode(mode: u32) -> Self {
        Self::from_bits_truncate(mode)
    }
}

/// The type of a file in the archive, as given by the `S_IFMT` bits of its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// A regular file.
    File,

    /// A directory.
    Dir,

    /// A symbolic link.
    Symlink,

    /// Anything else, like a pipe, a socket, or a device node.
    ///
    /// These are recognized, but they never have contents and are never dereferenced.
    Other,
}

impl FileType {
    /// Determine the file type from a full Unix `mode`.
    pub fn from_mode(mode: u32) -> Self {
        match mode & TYPE_MASK {
            FILE_MODE => Self::File,
            DIR_MODE => Self::Dir,
            SYMLINK_MODE => Self::Symlink,
            _ => Self::Other,
        }
    }

    // The character `ls -l` uses for this file type.
    fn symbol(self) -> char {
        match self {
            Self::File => '-',
            Self::Dir => 'd',
            Self::Symlink => 'l',
            Self::Other => '?',
        }
    }
}

/// A full Unix file mode: the file type plus its permissions.
///
/// This formats the same way `ls -l` does.
///
/// ```
/// use sqlarvfs::Mode;
///
/// assert_eq!(Mode::new(0o40755).to_string(), "drwxr-xr-x");
/// assert_eq!(Mode::new(0o104755).to_string(), "-rwsr-xr-x");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode(u32);

impl Mode {
    /// Wrap a raw Unix mode.
    pub fn new(mode: u32) -> Self {
        Self(mode)
    }

    /// The raw Unix mode.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// The file type bits.
    pub fn kind(self) -> FileType {
        FileType::from_mode(self.0)
    }

    /// The permission bits.
    pub fn permissions(self) -> FileMode {
        FileMode::from_mode(self.0)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let perms = self.permissions();

        let bit = |flag: FileMode, symbol: char| {
            if perms.contains(flag) {
                symbol
            } else {
                '-'
            }
        };

        // The execute column doubles as the setuid/setgid/sticky column.
        let exec = |flag: FileMode, special: FileMode, lower: char, upper: char| {
            match (perms.contains(special), perms.contains(flag)) {
                (true, true) => lower,
                (true, false) => upper,
                (false, true) => 'x',
                (false, false) => '-',
            }
        };

        let symbols = [
            self.kind().symbol(),
            bit(FileMode::OWNER_R, 'r'),
            bit(FileMode::OWNER_W, 'w'),
            exec(FileMode::OWNER_X, FileMode::SUID, 's', 'S'),
            bit(FileMode::GROUP_R, 'r'),
            bit(FileMode::GROUP_W, 'w'),
            exec(FileMode::GROUP_X, FileMode::SGID, 's', 'S'),
            bit(FileMode::OTHER_R, 'r'),
            bit(FileMode::OTHER_W, 'w'),
            exec(FileMode::OTHER_X, FileMode::STICKY, 't', 'T'),
        ];

        symbols.iter().try_for_each(|symbol| write!(f, "{}", symbol))
    }
}
