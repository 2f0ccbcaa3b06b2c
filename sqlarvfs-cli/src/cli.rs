use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use super::size::SizeFormat;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// The name of the table in the database that holds the archive.
    #[arg(long, global = true, env = "SQLAR_TABLE", default_value = sqlarvfs::DEFAULT_TABLE)]
    pub table: String,

    /// Compare file names case-insensitively.
    #[arg(long, global = true, env = "SQLAR_CASE_INSENSITIVE")]
    pub case_insensitive: bool,

    /// List directories before other files (default).
    #[arg(long = "directories-first", global = true, default_value = "true")]
    _directories_first: bool,

    /// Don't list directories before other files.
    #[arg(
        long,
        global = true,
        env = "SQLAR_NO_DIRECTORIES_FIRST",
        default_value = "false",
        overrides_with = "_directories_first"
    )]
    pub no_directories_first: bool,

    /// How to print file sizes.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "SQLAR_SIZE_FORMAT",
        default_value_t = SizeFormat::Binary
    )]
    pub size_format: SizeFormat,

    /// Log more detail to stderr. Pass twice for even more.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// The directory to list.
    ///
    /// If this is a file, only that file is listed.
    #[arg(default_value = "/")]
    pub path: String,

    /// The path of the SQLite archive.
    #[arg(long, short)]
    pub archive: PathBuf,

    /// Show the mode, size, and modification time of each file.
    #[arg(long, short, default_value = "false")]
    pub long: bool,
}

#[derive(Args, Debug, Clone)]
pub struct Cat {
    /// The file to print.
    pub path: String,

    /// The path of the SQLite archive.
    #[arg(long, short)]
    pub archive: PathBuf,

    /// Start printing this many bytes into the file.
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
}

#[derive(Args, Debug, Clone)]
pub struct Stat {
    /// The file to describe.
    ///
    /// If this is a symbolic link, the link itself is described.
    pub path: String,

    /// The path of the SQLite archive.
    #[arg(long, short)]
    pub archive: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the files in a directory.
    #[command(visible_alias = "list")]
    Ls(Ls),

    /// Print the contents of a file.
    Cat(Cat),

    /// Describe a file.
    Stat(Stat),
}
