//! Tooling & Integration Layer
//!
//! The command-line front end over `NestedSet` and its text/JSON renderers.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands, OutputFormat};
