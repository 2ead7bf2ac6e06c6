//! Plain lookup between tracker statuses and board columns.
//!
//! This is the fallback table used for generic column listings. Board
//! placement goes through [`crate::rules::assign_column`], which layers
//! business rules on top.
//!
//! Unknown statuses land in the backlog instead of failing, because status
//! strings come from the tracker and are not under our control. Unknown
//! *columns* are a caller bug and fail with [`BoardError::UnknownColumn`].

use crate::error::{BoardError, Result};
use crate::types::{BugStatus, Column};

/// Forward table: remote status → column
const STATUS_COLUMNS: &[(&str, Column)] = &[
    ("UNCONFIRMED", Column::Backlog),
    ("NEW", Column::Backlog),
    ("ASSIGNED", Column::Todo),
    ("IN_PROGRESS", Column::InProgress),
    ("RESOLVED", Column::Done),
    ("VERIFIED", Column::Done),
    ("CLOSED", Column::Done),
];

/// Statuses that belong to each column. The first entry is what a card
/// dropped into the column is moved to.
fn column_statuses(column: Column) -> &'static [&'static str] {
    match column {
        Column::Backlog => &["NEW", "UNCONFIRMED"],
        Column::Todo => &["ASSIGNED"],
        Column::InProgress => &["IN_PROGRESS"],
        Column::InTesting => &["RESOLVED"],
        Column::Done => &["RESOLVED", "VERIFIED", "CLOSED"],
    }
}

/// Map a remote status to its column, ignoring case. Unknown statuses map to the backlog.
pub fn status_to_column(status: &str) -> Column {
    let upper = status.trim().to_ascii_uppercase();
    STATUS_COLUMNS
        .iter()
        .find(|(s, _)| *s == upper)
        .map(|(_, column)| *column)
        .unwrap_or(Column::Backlog)
}

/// The remote status a card moves to when dropped into `column`
pub fn remote_status(column: Column) -> BugStatus {
    BugStatus::parse(column_statuses(column)[0])
}

/// Map a column identifier to a remote status.
///
/// Fails with [`BoardError::UnknownColumn`] for anything outside the fixed column set.
pub fn column_to_status(column: &str) -> Result<BugStatus> {
    let column = column
        .parse::<Column>()
        .map_err(|_| BoardError::unknown_column(column))?;
    Ok(remote_status(column))
}

/// All statuses that belong to a column; empty for an unknown column
pub fn statuses_for_column(column: &str) -> Vec<BugStatus> {
    column
        .parse::<Column>()
        .map(|c| {
            column_statuses(c)
                .iter()
                .map(|s| BugStatus::parse(s))
                .collect()
        })
        .unwrap_or_default()
}

/// Whether `column` names one of the board columns (case-sensitive)
pub fn is_valid_column(column: &str) -> bool {
    column.parse::<Column>().is_ok()
}

/// The board columns in display order
pub fn available_columns() -> &'static [Column] {
    &Column::ALL
}
