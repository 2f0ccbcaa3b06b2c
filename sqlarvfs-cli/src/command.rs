use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use sqlarvfs::{Archive, ArchiveOptions, FileType, NodeRef};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use super::cli::{Cat, Cli, Commands, GlobalOptions, Ls, Stat};
use super::error::user_err;
use super::size::format_size;

impl GlobalOptions {
    pub fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions::new()
            .table(&self.table)
            .case_insensitive(self.case_insensitive)
            .directories_first(!self.no_directories_first)
    }

    fn open(&self, path: &Path) -> eyre::Result<Archive> {
        if !path.exists() {
            return Err(user_err!("This archive does not exist: {}", path.display()));
        }

        debug!(archive = %path.display(), table = %self.table, "Opening archive");

        match Archive::open_with(path, &self.archive_options()) {
            Ok(archive) => Ok(archive),
            Err(err @ sqlarvfs::Error::InvalidArgs { .. }) => Err(user_err!("{}", err)),
            Err(err) => Err(err.into()),
        }
    }
}

fn format_mtime(mtime: Option<SystemTime>) -> eyre::Result<String> {
    match mtime {
        Some(mtime) => Ok(OffsetDateTime::from(mtime).format(&Rfc3339)?),
        None => Ok(String::from("-")),
    }
}

fn display_name(node: &NodeRef<'_>) -> String {
    if node.kind() == FileType::Dir {
        format!("{}/", node.name())
    } else {
        node.name().to_owned()
    }
}

fn kind_name(kind: FileType) -> &'static str {
    match kind {
        FileType::File => "regular file",
        FileType::Dir => "directory",
        FileType::Symlink => "symbolic link",
        FileType::Other => "special file",
    }
}

fn find<'a>(archive: &'a Archive, path: &str) -> eyre::Result<NodeRef<'a>> {
    archive
        .find_path(path, false)
        .ok_or_else(|| user_err!("This file was not found: {}", path))
}

impl Ls {
    fn write_entry(
        &self,
        opts: &GlobalOptions,
        node: &NodeRef<'_>,
        stdout: &mut impl Write,
    ) -> eyre::Result<()> {
        if !self.long {
            writeln!(stdout, "{}", display_name(node))?;
            return Ok(());
        }

        write!(
            stdout,
            "{} {:>10} {:<20} {}",
            node.mode(),
            format_size(node.size(), opts.size_format),
            format_mtime(node.mtime())?,
            display_name(node)
        )?;

        if let Some(target) = node.link_target() {
            write!(stdout, " -> {}", target)?;
        }

        writeln!(stdout)?;

        Ok(())
    }

    pub fn run(&self, opts: &GlobalOptions, mut stdout: impl Write) -> eyre::Result<()> {
        let archive = opts.open(&self.archive)?;

        // Anything that isn't a directory is listed by itself.
        let entries = match archive.read_dir(self.path.as_str()) {
            Ok(entries) => entries,
            Err(sqlarvfs::Error::NotADirectory { .. } | sqlarvfs::Error::BrokenSymlink { .. }) => {
                vec![find(&archive, &self.path)?]
            }
            Err(sqlarvfs::Error::FileNotFound { .. }) => {
                return Err(user_err!("This file was not found: {}", self.path))
            }
            Err(err) => return Err(err.into()),
        };

        for entry in &entries {
            self.write_entry(opts, entry, &mut stdout)?;
        }

        Ok(())
    }
}

impl Cat {
    pub fn run(&self, opts: &GlobalOptions, mut stdout: impl Write) -> eyre::Result<()> {
        let archive = opts.open(&self.archive)?;

        let node = find(&archive, &self.path)?
            .dereference()
            .ok_or_else(|| user_err!("This symbolic link is broken or recursive: {}", self.path))?;

        let file = match (node.as_file(), node.kind()) {
            (Some(file), _) => file,
            (None, kind) => {
                return Err(user_err!(
                    "This is a {}, not a regular file: {}",
                    kind_name(kind),
                    self.path
                ))
            }
        };

        let mut reader = archive.reader_at(file, self.offset)?;

        io::copy(&mut reader, &mut stdout)?;

        Ok(())
    }
}

impl Stat {
    pub fn run(&self, opts: &GlobalOptions, mut stdout: impl Write) -> eyre::Result<()> {
        let archive = opts.open(&self.archive)?;
        let node = find(&archive, &self.path)?;

        let kind = if node.is_implicit() {
            format!("{} (implicit)", kind_name(node.kind()))
        } else {
            kind_name(node.kind()).to_owned()
        };

        writeln!(stdout, "Path: {}", node.path())?;
        writeln!(stdout, "Type: {}", kind)?;
        writeln!(stdout, "Mode: {}", node.mode())?;
        writeln!(stdout, "Size: {}", format_size(node.size(), opts.size_format))?;
        writeln!(
            stdout,
            "Stored size: {}",
            format_size(node.stored_size(), opts.size_format)
        )?;

        match node.compression_ratio() {
            Some(ratio) => writeln!(stdout, "Compression ratio: {:.2}", ratio)?,
            None => writeln!(stdout, "Compression ratio: -")?,
        }

        writeln!(stdout, "Modified: {}", format_mtime(node.mtime())?)?;

        if let Some(target) = node.link_target() {
            match node.target() {
                Some(resolved) => writeln!(stdout, "Target: {} ({})", target, resolved.path())?,
                None => writeln!(stdout, "Target: {} (broken)", target)?,
            }
        }

        Ok(())
    }
}

impl Cli {
    pub fn dispatch(&self, stdout: impl Write) -> eyre::Result<()> {
        match &self.command {
            Commands::Ls(ls) => ls.run(&self.options, stdout),
            Commands::Cat(cat) => cat.run(&self.options, stdout),
            Commands::Stat(stat) => stat.run(&self.options, stdout),
        }
    }
}
