mod cli;
mod command;
mod error;
mod size;

pub use cli::{Cat, Cli, Commands, GlobalOptions, Ls, Stat};
pub use error::UserError;
pub use size::{format_size, SizeFormat};
