use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::service::{self, QueryArgs, ServeArgs};

/// Find the trees nearest to a position.
#[derive(Debug, Parser)]
#[command(name = "nearby-trees", version, about, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the map page and the nearest-tree endpoint (default).
    Serve(ServeArgs),
    /// Print the nearest trees to a position as JSON.
    Query(QueryArgs),
}

pub fn handle_commands(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Serve(args)) => service::serve(args),
        Some(Command::Query(args)) => service::query(args),
        None => service::serve(cli.serve),
    }
}
