//! bzkanban CLI - Kanban board for Bugzilla.
//!
//! Commands:
//! - `bzkanban board`: Fetch bugs and show them grouped into columns
//! - `bzkanban columns`: List the columns and the statuses behind them
//! - `bzkanban move <id> <column>`: Move a bug to another column
//! - `bzkanban edit <id> [fields]`: Edit priority, severity, points, assignee,
//!   whiteboard, sprint membership or the qe-verify flag
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error, or at least one update was rejected

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level
    let filter = if cli.debug {
        EnvFilter::new("bzkanban=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Columns => commands::run_columns(),
        ref command => commands::report(run_remote(&cli, command).await),
    };

    std::process::exit(exit_code);
}

/// Commands that talk to the tracker
async fn run_remote(cli: &Cli, command: &Commands) -> Result<i32, bzkanban::BoardError> {
    let config = commands::load_config(cli)?;
    let client = commands::client(&config)?;
    let credential = config.api_key.clone().unwrap_or_default();

    match command {
        Commands::Board {
            product,
            component,
            assignee,
            limit,
            json,
        } => {
            let filters = commands::board_filters(
                &config,
                product.clone(),
                component.clone(),
                assignee.clone(),
                *limit,
            );
            commands::run_board(&client, &credential, &filters, *json).await
        }
        Commands::Move { id, column } => {
            commands::run_move(&client, &credential, *id, *column).await
        }
        Commands::Edit(args) => commands::run_edit(&client, &credential, args).await,
        Commands::Columns => Ok(commands::run_columns()),
    }
}
