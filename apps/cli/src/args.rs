//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mhost")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Inspect tenant shells, feature ordering and request routing")]
pub struct Cli {
    /// Host configuration file (TOML, YAML or JSON); `MHOST__*` variables override it.
    #[arg(short, long, global = true, default_value = "mhost.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build every configured shell and print its feature order
    Shells,
    /// Print the global feature dependency order
    Features,
    /// Resolve the shell a request would be served by
    Resolve(ResolveArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Request host, e.g. `acme.example.com:443`
    #[arg(long)]
    pub host: Option<String>,

    /// Request path, e.g. `/acme/invoices`
    #[arg(long)]
    pub path: Option<String>,

    /// Request header as `Name=Value`; repeatable
    #[arg(long = "header", value_parser = parse_pair)]
    pub headers: Vec<(String, String)>,

    /// Authenticated claim as `Name=Value`; repeatable
    #[arg(long = "claim", value_parser = parse_pair)]
    pub claims: Vec<(String, String)>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected `Name=Value`, got `{raw}`"))
}
