//! CLI command implementations

pub mod check;
pub mod error;
pub mod run;

pub use check::{CheckArgs, CheckReport};
pub use error::CliError;
pub use run::{Cli, Commands, OutputFormat, OverrideArgs, RunArgs};
