//! Column placement rules.
//!
//! Several rules can match the same bug, so they are evaluated in a fixed
//! order and the first match wins:
//!
//! 1. `ASSIGNED` → in-progress, regardless of tags
//! 2. `RESOLVED` + `FIXED` + `qe-verify+` → in-testing
//! 3. `RESOLVED`, `VERIFIED`, `CLOSED` → done
//! 4. `IN_PROGRESS` → in-progress
//! 5. `NEW`/`UNCONFIRMED` with the sprint tag → todo
//! 6. everything else → backlog

use crate::sprint_tag::has_sprint_tag;
use crate::types::{Bug, BugStatus, Column, FlagStatus, QE_VERIFY_FLAG};

/// Resolution that qualifies a resolved bug for verification
pub const FIXED: &str = "FIXED";

/// Decide which column a bug is shown in
pub fn assign_column(bug: &Bug) -> Column {
    match bug.status {
        BugStatus::Assigned => Column::InProgress,
        BugStatus::Resolved if is_fixed(bug) && has_qe_verify_flag(bug) => Column::InTesting,
        BugStatus::Resolved | BugStatus::Verified | BugStatus::Closed => Column::Done,
        BugStatus::InProgress => Column::InProgress,
        BugStatus::New | BugStatus::Unconfirmed if has_sprint_tag(&bug.whiteboard) => Column::Todo,
        _ => Column::Backlog,
    }
}

/// True iff the bug carries `qe-verify` with status exactly `+`
pub fn has_qe_verify_flag(bug: &Bug) -> bool {
    bug.flags
        .iter()
        .any(|f| f.name == QE_VERIFY_FLAG && f.status == FlagStatus::Granted)
}

fn is_fixed(bug: &Bug) -> bool {
    bug.resolution.as_deref() == Some(FIXED)
}
