//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Singer tap for the Recharge subscription-commerce API
#[derive(Parser, Debug)]
#[command(name = "recharge-tap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify credentials and print the stream catalog
    Discover,

    /// Replicate selected streams, emitting messages to stdout
    Sync {
        /// Catalog file (JSON); defaults to every discovered stream
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// State file (JSON) from a prior run
        #[arg(short, long)]
        state: Option<PathBuf>,
    },
}
