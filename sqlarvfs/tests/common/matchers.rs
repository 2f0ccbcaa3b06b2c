use std::fmt;
use std::mem::{self, Discriminant};

use sqlarvfs::Path;
use xpct::core::Matcher;
use xpct::{all, be_err, be_some, equal, why};

// Match an `Option<Path>` which is `Some` and equal to `expected`.
pub fn be_found_at<'a>(expected: &'a str) -> Matcher<'a, Option<Path>, Path, ()> {
    all(move |ctx| {
        ctx.to(why(be_some(), "this file was not found"))?
            .to(equal(Path::new(expected)))
    })
}

// Match a result which failed with the same variant of `sqlarvfs::Error` as `expected`, ignoring
// any fields.
pub fn fail_like<'a, T>(
    expected: sqlarvfs::Error,
) -> Matcher<'a, sqlarvfs::Result<T>, Discriminant<sqlarvfs::Error>, ()>
where
    T: fmt::Debug + 'a,
{
    all(move |ctx| {
        ctx.to(be_err())?
            .map(|err: sqlarvfs::Error| mem::discriminant(&err))
            .to(equal(mem::discriminant(&expected)))
    })
}
