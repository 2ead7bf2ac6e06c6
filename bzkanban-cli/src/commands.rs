//! Command runners. Each returns the process exit code.

use bzkanban::mapper::{available_columns, statuses_for_column};
use bzkanban::{
    ApplyResult, Board, BoardConfig, BoardError, Bug, BugFilters, BugId, BugTracker,
    BugzillaClient, Column, ConfigLoader, Ledger, RemoteError,
};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::debug;

use crate::cli::{Cli, EditArgs};

/// Load configuration and apply the global command-line overrides
pub fn load_config(cli: &Cli) -> Result<BoardConfig, BoardError> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load()?;

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }
    Ok(config)
}

/// Print the error the way every command reports failure
pub fn report(result: Result<i32, BoardError>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

/// `bzkanban board`
pub async fn run_board<T: BugTracker + ?Sized>(
    tracker: &T,
    credential: &str,
    filters: &BugFilters,
    json: bool,
) -> Result<i32, BoardError> {
    let bugs = tracker.get_bugs(credential, filters).await?;
    debug!(count = bugs.len(), "fetched bugs");

    let board = Board::build(&bugs, &Ledger::new());
    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        println!("{}", render_board(&board));
    }
    Ok(0)
}

/// `bzkanban columns`
pub fn run_columns() -> i32 {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Column", "Id", "Statuses"]);

    for column in available_columns() {
        let statuses: Vec<String> = statuses_for_column(column.as_str())
            .iter()
            .map(|s| s.to_string())
            .collect();
        table.add_row(vec![
            column.title().to_string(),
            column.as_str().to_string(),
            statuses.join(", "),
        ]);
    }

    println!("{table}");
    0
}

/// `bzkanban move`
pub async fn run_move<T: BugTracker + ?Sized>(
    tracker: &T,
    credential: &str,
    id: BugId,
    column: Column,
) -> Result<i32, BoardError> {
    let bug = fetch_bug(tracker, credential, id).await?;
    let mut ledger = Ledger::new();
    ledger.stage_move(&bug, column);
    apply(&mut ledger, tracker, credential).await
}

/// `bzkanban edit`
pub async fn run_edit<T: BugTracker + ?Sized>(
    tracker: &T,
    credential: &str,
    args: &EditArgs,
) -> Result<i32, BoardError> {
    let bug = fetch_bug(tracker, credential, args.id).await?;
    let mut ledger = Ledger::new();
    stage_edits(&mut ledger, &bug, args);
    apply(&mut ledger, tracker, credential).await
}

/// Stage every field `args` names against the fetched bug
pub fn stage_edits(ledger: &mut Ledger, bug: &Bug, args: &EditArgs) {
    if let Some(priority) = args.priority {
        ledger.stage_priority(bug, priority);
    }
    if let Some(severity) = &args.severity {
        ledger.stage_severity(bug, severity.as_str());
    }
    if let Some(points) = args.points_edit() {
        ledger.stage_points(bug, points);
    }
    if let Some(assignee) = &args.assignee {
        ledger.stage_assignee(bug, assignee.as_str());
    }
    // Whiteboard first: the sprint toggle builds on the pending whiteboard.
    if let Some(whiteboard) = &args.whiteboard {
        ledger.stage_whiteboard(bug, whiteboard.as_str());
    }
    if let Some(in_sprint) = args.sprint_membership() {
        ledger.stage_sprint(bug, in_sprint);
    }
    if let Some(qe_verify) = args.qe_verify {
        ledger.stage_qe_verify(bug, qe_verify);
    }
}

async fn fetch_bug<T: BugTracker + ?Sized>(
    tracker: &T,
    credential: &str,
    id: BugId,
) -> Result<Bug, BoardError> {
    let bugs = tracker
        .get_bugs(credential, &BugFilters::new().with_id(id))
        .await?;
    bugs.into_iter()
        .find(|bug| bug.id == id)
        .ok_or(BoardError::Remote(RemoteError::NotFound))
}

async fn apply<T: BugTracker + ?Sized>(
    ledger: &mut Ledger,
    tracker: &T,
    credential: &str,
) -> Result<i32, BoardError> {
    if !ledger.has_changes() {
        println!("Nothing to change");
        return Ok(0);
    }

    let result = ledger.apply_changes(tracker, credential).await?;
    println!("{}", summary(&result));
    if let Some(error) = ledger.apply_error() {
        eprintln!("Error: {}", error);
    }
    Ok(if result.is_complete_success() { 0 } else { 1 })
}

fn summary(result: &ApplyResult) -> String {
    match result.fail_count {
        0 => format!("Applied {} change(s)", result.success_count),
        failed => format!(
            "Applied {} change(s), {} failed",
            result.success_count, failed
        ),
    }
}

/// Render the board as one table, a column per board column
pub fn render_board(board: &Board) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(
        board
            .columns
            .iter()
            .map(|view| format!("{} ({})", view.column.title(), view.cards.len()))
            .collect::<Vec<_>>(),
    );

    let rows = board
        .columns
        .iter()
        .map(|view| view.cards.len())
        .max()
        .unwrap_or(0);
    for row in 0..rows {
        table.add_row(
            board
                .columns
                .iter()
                .map(|view| {
                    view.cards
                        .get(row)
                        .map(|card| {
                            let marker = if card.staged { "*" } else { "" };
                            format!("#{}{} {}", card.bug.id, marker, card.bug.summary)
                        })
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>(),
        );
    }

    table
}

/// Build the client for `config`
pub fn client(config: &BoardConfig) -> Result<BugzillaClient, BoardError> {
    BugzillaClient::from_config(config)
}

/// Filters for `board`, falling back to the configured product and component
pub fn board_filters(
    config: &BoardConfig,
    product: Option<String>,
    component: Option<String>,
    assignee: Option<String>,
    limit: Option<usize>,
) -> BugFilters {
    let mut filters = BugFilters::new();
    if let Some(product) = product.or_else(|| config.product.clone()) {
        filters = filters.with_product(product);
    }
    if let Some(component) = component.or_else(|| config.component.clone()) {
        filters = filters.with_component(component);
    }
    if let Some(assignee) = assignee {
        filters = filters.with_assignee(assignee);
    }
    if let Some(limit) = limit {
        filters = filters.with_limit(limit);
    }
    filters
}
