//! resolvarr - debrid source checking and resolution
//!
//! # Usage
//!
//! ```bash
//! resolvarr providers
//! resolvarr enable rd --api-key XXXX
//! resolvarr check tt1877830 -p rd --hashes aaaa...,bbbb...
//! resolvarr resolve "magnet:?xt=urn:btih:..." -p rd -t "The Batman"
//! ```

// Library surface is re-declared here; not every entry point is wired to a
// subcommand yet
#![allow(dead_code)]

mod cache;
mod cli;
mod commands;
mod config;
mod debrid;
mod models;
mod sources;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Output};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(&cli);

    let exit_code = match cli.command {
        Command::Providers => commands::providers_cmd(&output),
        Command::Enable(cmd) => commands::enable_cmd(cmd, &output),
        Command::Disable(cmd) => commands::disable_cmd(cmd, &output),
        Command::Check(cmd) => commands::check_cmd(cmd, &output).await,
        Command::Resolve(cmd) => commands::resolve_cmd(cmd, &output).await,
    };
    std::process::exit(exit_code.into());
}
