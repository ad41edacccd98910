//! # rlst — relaystack CLI
//!
//! Synthesizes the LiteLLM proxy deployment: network, role, firewall and
//! instance, with the bootstrap script embedded in the launch configuration.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
