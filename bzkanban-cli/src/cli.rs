//! CLI definition for the bzkanban command-line interface.

use std::path::PathBuf;

use bzkanban::{BugId, Column, Points, Priority, QeVerifyStatus};
use clap::{Args, Parser, Subcommand};

/// Kanban board over a Bugzilla instance.
///
/// Bugs are placed into backlog, todo, in-progress, in-testing and done
/// columns based on their status, qe-verify flag and whiteboard sprint tag.
/// `move` and `edit` stage the requested changes and commit them in a
/// single batch.
#[derive(Parser, Debug)]
#[command(name = "bzkanban")]
#[command(version)]
#[command(about = "Kanban board for Bugzilla")]
#[command(
    long_about = "Kanban board for Bugzilla.\n\n\
    Configuration is read from ~/.bzkanban/config.{toml,yaml,json}, then \
    ./bzkanban.{toml,yaml,json}, then the environment.\n\n\
    Environment variables:\n  \
    BZKANBAN_BASE_URL      Bugzilla instance to talk to\n  \
    BZKANBAN_API_KEY       API key used to apply changes\n  \
    BZKANBAN_PRODUCT       Default product filter\n  \
    BZKANBAN_COMPONENT     Default component filter\n  \
    BZKANBAN_TIMEOUT_SECS  Request timeout in seconds"
)]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Extra configuration file, merged over the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Bugzilla base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// API key, overrides the configured one
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch bugs and show them as a board
    Board {
        /// Product to show (defaults to the configured product)
        #[arg(long)]
        product: Option<String>,
        /// Component to show (defaults to the configured component)
        #[arg(long)]
        component: Option<String>,
        /// Only bugs assigned to this user
        #[arg(long)]
        assignee: Option<String>,
        /// Maximum number of bugs to fetch
        #[arg(long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List board columns and the statuses behind them
    Columns,

    /// Move a bug to another column
    Move {
        /// Bug id, with or without a leading '#'
        id: BugId,
        /// Target column (backlog, todo, in-progress, in-testing, done)
        column: Column,
    },

    /// Edit fields of a bug
    Edit(EditArgs),
}

/// Field edits for `bzkanban edit`
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Bug id, with or without a leading '#'
    pub id: BugId,

    /// New priority: P1..P5, or none to unset
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,

    /// New severity (e.g. S2)
    #[arg(long)]
    pub severity: Option<String>,

    /// Story points; an empty value clears them
    #[arg(long)]
    pub points: Option<String>,

    /// New assignee email
    #[arg(long)]
    pub assignee: Option<String>,

    /// Replace the whiteboard text
    #[arg(long)]
    pub whiteboard: Option<String>,

    /// Add the sprint tag to the whiteboard
    #[arg(long, conflicts_with = "no_sprint")]
    pub sprint: bool,

    /// Remove the sprint tag from the whiteboard
    #[arg(long)]
    pub no_sprint: bool,

    /// qe-verify flag: plus, minus, or unknown to clear it
    #[arg(long, value_parser = parse_qe_verify)]
    pub qe_verify: Option<QeVerifyStatus>,
}

impl EditArgs {
    /// Requested sprint membership, if either flag was given
    pub fn sprint_membership(&self) -> Option<bool> {
        match (self.sprint, self.no_sprint) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Requested points edit; `Some(None)` clears the points
    pub fn points_edit(&self) -> Option<Option<Points>> {
        self.points.as_deref().map(|s| {
            if s.trim().is_empty() {
                None
            } else {
                Some(Points::parse(s))
            }
        })
    }
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    let priority = Priority::parse(s);
    if priority == Priority::Unknown && !matches!(s.trim(), "--" | "none") {
        return Err(format!("'{}' is not a priority (expected P1..P5 or none)", s));
    }
    Ok(priority)
}

fn parse_qe_verify(s: &str) -> Result<QeVerifyStatus, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "plus" | "+" | "minus" | "-" | "unknown" => Ok(QeVerifyStatus::parse(s)),
        _ => Err(format!(
            "'{}' is not a qe-verify value (expected plus, minus or unknown)",
            s
        )),
    }
}
