mod common;

use std::io::prelude::*;
use std::thread;
use std::time::Duration;

use sqlarvfs::{Archive, ArchiveOptions, Error};
use xpct::{be_err, be_some, be_true, equal, expect, match_pattern, pattern};

use common::{fail_like, random_bytes, with_timeout, TestArchive};

//
// `Archive::open`
//

#[test]
fn opening_errors_when_db_does_not_exist() -> sqlarvfs::Result<()> {
    let temp_dir = tempfile::tempdir()?;

    let result = Archive::open(temp_dir.path().join("missing.sqlar"));

    expect!(result).to(fail_like(Error::Sqlite { code: None }));

    Ok(())
}

#[test]
fn opening_errors_when_file_is_not_a_db() -> sqlarvfs::Result<()> {
    let mut temp_file = tempfile::NamedTempFile::new()?;
    temp_file.write_all(b"not a database, but long enough to look like one might")?;
    temp_file.flush()?;

    let result = Archive::open(temp_file.path());

    expect!(result)
        .to(be_err())
        .to(match_pattern(pattern!(Error::Sqlite { code: Some(_) })));

    Ok(())
}

#[test]
fn opening_errors_when_table_does_not_exist() -> sqlarvfs::Result<()> {
    let test = TestArchive::new();

    let result = test.open_with(&ArchiveOptions::new().table("missing"));

    expect!(result).to(fail_like(Error::InvalidArgs {
        reason: String::new(),
    }));

    Ok(())
}

#[test]
fn opening_with_empty_table_name_errors() -> sqlarvfs::Result<()> {
    let test = TestArchive::new();

    let result = test.open_with(&ArchiveOptions::new().table(""));

    expect!(result).to(fail_like(Error::InvalidArgs {
        reason: String::new(),
    }));

    Ok(())
}

#[test]
fn opening_with_custom_table_name() -> sqlarvfs::Result<()> {
    let test = TestArchive::with_table("my \"files\"");
    test.file("file", b"contents");

    let archive = test.open_with(&ArchiveOptions::new().table("my \"files\""))?;

    let mut contents = String::new();
    archive.open_path("file")?.read_to_string(&mut contents)?;

    expect!(contents).to(equal("contents"));
    expect!(archive.tree().options().table_name()).to(equal("my \"files\""));

    Ok(())
}

//
// `Archive::try_clone`
//

#[test]
fn cloned_archive_shares_the_tree() -> sqlarvfs::Result<()> {
    let test = TestArchive::new();
    test.file("file", b"contents");

    let archive = test.open()?;
    let clone = archive.try_clone()?;

    expect!(std::ptr::eq(archive.tree(), clone.tree())).to(be_true());
    expect!(clone.find_path("file", true)).to(be_some());

    Ok(())
}

#[test]
fn concurrent_readers_see_the_same_contents() -> sqlarvfs::Result<()> {
    let test = TestArchive::new();
    let expected = random_bytes(64 * 1024);

    test.file("big", &expected);
    test.compressed_file("big-compressed", &expected);

    let archive = test.open()?;

    let handles = (0..8)
        .map(|i| -> sqlarvfs::Result<_> {
            let archive = archive.try_clone()?;
            let expected = expected.clone();
            let name = if i % 2 == 0 { "big" } else { "big-compressed" };

            Ok(thread::spawn(move || -> sqlarvfs::Result<()> {
                let mut actual = Vec::new();
                archive.open_path(name)?.read_to_end(&mut actual)?;

                expect!(actual).to(equal(expected));

                Ok(())
            }))
        })
        .collect::<sqlarvfs::Result<Vec<_>>>()?;

    for handle in handles {
        handle.join().unwrap()?;
    }

    Ok(())
}

#[test]
fn tree_can_be_shared_without_a_connection() -> sqlarvfs::Result<()> {
    let test = TestArchive::new();
    test.file("a/b/c", b"");

    let tree = test.open()?.shared_tree();

    with_timeout(Duration::from_secs(5), move || {
        let handles = (0..4)
            .map(|_| {
                let tree = tree.clone();

                thread::spawn(move || {
                    tree.find_path("/a/b/c", true)
                        .map(|node| node.parent().map(|parent| parent.size()))
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            expect!(handle.join().unwrap()).to(equal(Some(Some(0))));
        }

        Ok(())
    })
}
