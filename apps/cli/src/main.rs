use anyhow::Context;
use clap::Parser;
use mhost::kernel::config::load_config;
use mhost_cli::AppConfig;
use mhost_cli::args::{Cli, Command};
use mhost_cli::commands;
use mhost_logger::Logger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: AppConfig = load_config(Some(&cli.config))
        .with_context(|| format!("Critical: cannot load {}", cli.config.display()))?;
    let _logger = Logger::from_config(env!("CARGO_PKG_NAME"), &config.log)?;

    let runtime = commands::runtime(&config)?;
    let mut out = std::io::stdout().lock();
    tracing::debug!(command = ?cli.command, "Dispatching");

    match &cli.command {
        Command::Shells => commands::shells(&runtime, &mut out)?,
        Command::Features => commands::features(&runtime, &mut out)?,
        Command::Resolve(args) => commands::resolve(&runtime, args, &mut out)?,
    }

    runtime.host().dispose();
    Ok(())
}
