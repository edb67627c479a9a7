//! Command-line interface
//!
//! Provides:
//! - `Cli` - argument parsing
//! - `Runner` - executes discover or sync against the configured account

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
