use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
mod testutil;

mod compiler;
mod config;
mod events;
mod filespec;
mod init;
mod ledger;
mod record;
mod report;
mod validate;

use config::Config;

#[derive(Debug, Parser)]
/// Records expenses per event and renders them into typeset reports.
struct Command {
    /// Config file to read. Defaults to "eventledger.ron" in the current
    /// directory if present.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
    /// Log what each step does. `RUST_LOG` takes precedence.
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,
    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Lists known events and their dates.
    #[command(name = "events")]
    Events(events::Cmd),
    /// Writes a default config, report template and event table, keeping
    /// any that already exist.
    #[command(name = "init")]
    Init(init::Cmd),
    /// Renders an event's ledger into report fragments and compiles the
    /// report.
    #[command(name = "render")]
    Render(report::cmd::Command),
    /// Validates an invoice and appends it to its event's ledger.
    #[command(name = "submit")]
    Submit(ledger::cmd::Command),
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "eventledger=debug"
    } else {
        "eventledger=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cmd = Command::parse();
    init_tracing(cmd.verbose);
    let config = Config::load(cmd.config.as_deref())?;
    use SubCommand::*;
    match cmd.subcmd {
        Events(cmd) => cmd.run(&config),
        Init(cmd) => cmd.run(&config),
        Render(cmd) => cmd.run(&config),
        Submit(cmd) => cmd.run(&config),
    }
}
