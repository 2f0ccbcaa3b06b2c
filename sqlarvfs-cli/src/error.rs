use std::error::Error;
use std::fmt;

/// A failure caused by the user's input, like a path that isn't in the archive.
///
/// These are printed as a plain message, without a backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserError(pub String);

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for UserError {}

macro_rules! user_err {
    ($($args:tt)*) => {
        eyre::Report::new($crate::error::UserError(format!($($args)*)))
    };
}

pub(crate) use user_err;
