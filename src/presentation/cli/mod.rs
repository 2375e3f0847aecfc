//! CLI module

mod commands;
mod progress;

pub use commands::{CategoryArg, Cli, Commands, build_selection};
pub use progress::ProgressReporter;
