mod common;

use common::{command, TestArchive};
use xpct::{be_ok, eq_diff, equal, expect};

#[test]
fn stat_describes_a_file() -> eyre::Result<()> {
    let test = TestArchive::new()?;
    test.file("dir/file", &[0u8; 2048])?;

    expect!(command(&["stat", "/dir/file", "-a", &test.path_str()]))
        .to(be_ok())
        .to(eq_diff(
            "Path: /dir/file\n\
             Type: regular file\n\
             Mode: -rw-r--r--\n\
             Size: 2 KiB\n\
             Stored size: 2 KiB\n\
             Compression ratio: 1.00\n\
             Modified: 2024-05-15T07:51:19Z",
        ));

    Ok(())
}

#[test]
fn stat_describes_an_implicit_directory() -> eyre::Result<()> {
    let test = TestArchive::new()?;
    test.file("dir/a", b"12345")?.file("dir/b", b"678")?;

    expect!(command(&[
        "stat",
        "dir",
        "--size-format",
        "bytes",
        "-a",
        &test.path_str()
    ]))
    .to(be_ok())
    .to(eq_diff(
        "Path: /dir\n\
         Type: directory (implicit)\n\
         Mode: drwxrwxrwx\n\
         Size: 8\n\
         Stored size: 8\n\
         Compression ratio: 1.00\n\
         Modified: 2024-05-15T07:51:19Z",
    ));

    Ok(())
}

#[test]
fn stat_describes_symlinks_without_following_them() -> eyre::Result<()> {
    let test = TestArchive::new()?;
    test.file("real/file", b"")?
        .symlink("link", "real/file")?
        .symlink("broken", "nowhere")?;

    expect!(command(&["stat", "link", "-a", &test.path_str()]))
        .to(be_ok())
        .to(eq_diff(
            "Path: /link\n\
             Type: symbolic link\n\
             Mode: lrwxrwxrwx\n\
             Size: 9 B\n\
             Stored size: 9 B\n\
             Compression ratio: -\n\
             Modified: 2024-05-15T07:51:19Z\n\
             Target: real/file (/real/file)",
        ));

    expect!(command(&["stat", "broken", "-a", &test.path_str()]))
        .to(be_ok())
        .map(|output| output.lines().last().map(str::to_owned))
        .to(equal(Some(String::from("Target: nowhere (broken)"))));

    Ok(())
}
