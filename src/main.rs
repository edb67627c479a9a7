// Allow common clippy pedantic lints
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! recharge-tap CLI
//!
//! Command-line entrypoint for the Recharge Singer tap

use clap::Parser;
use recharge_tap::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the message stream
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
