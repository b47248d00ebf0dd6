mod cli;
mod commands;
mod mcp;
mod page_range;
mod pdf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path, json } => {
            commands::info::run(&path, json)?;
        }
        Commands::Split {
            path,
            ranges,
            output_dir,
        } => {
            commands::split::run(&path, &ranges, &output_dir)?;
        }
        Commands::Delete {
            path,
            pages,
            output,
        } => {
            commands::delete::run(&path, &pages, &output)?;
        }
        Commands::Reorder {
            path,
            order,
            output,
        } => {
            commands::reorder::run(&path, &order, &output)?;
        }
        Commands::Rotate {
            path,
            rotations,
            output,
        } => {
            commands::rotate::run(&path, &rotations, &output)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(inputs.as_slice(), &output)?;
        }
        Commands::Text { path, pages } => {
            commands::text::run(&path, pages.as_deref())?;
        }
    }

    Ok(())
}
