//! In-memory buffer of unapplied bug edits.
//!
//! Each bug with pending edits has one [`StagedChange`] holding an optional
//! `{from, to}` record per editable field. Two invariants hold after every
//! operation:
//!
//! - a field record exists only while `from != to`
//! - a bug has an entry only while at least one field record exists
//!
//! Re-staging a field keeps the `from` recorded the first time, so moving a
//! card away and back again collapses to "no change" instead of staging a
//! no-op update. The `from_*`-free helpers ([`Ledger::stage_move`] and
//! friends) read `from` straight off the bug snapshot, which is the
//! preferred way to stage.
//!
//! Nothing here touches the network; see [`crate::reconciler`] for applying.

use crate::rules::assign_column;
use crate::sprint_tag::{add_sprint_tag, remove_sprint_tag};
use crate::types::{Bug, BugId, Column, Points, Priority, QeVerifyStatus};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Original and target value of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange<T> {
    pub from: T,
    pub to: T,
}

/// Pending edits for one bug
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StagedChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FieldChange<Column>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<FieldChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whiteboard: Option<FieldChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<FieldChange<Option<Points>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<FieldChange<Priority>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<FieldChange<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qe_verify: Option<FieldChange<QeVerifyStatus>>,
}

impl StagedChange {
    /// Number of fields with a pending edit
    pub fn field_count(&self) -> usize {
        [
            self.status.is_some(),
            self.assignee.is_some(),
            self.whiteboard.is_some(),
            self.points.is_some(),
            self.priority.is_some(),
            self.severity.is_some(),
            self.qe_verify.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

/// The staged change buffer.
///
/// Entries keep the order in which bugs were first staged, which is also the
/// order updates are sent in.
#[derive(Debug, Default)]
pub struct Ledger {
    pub(crate) changes: IndexMap<BugId, StagedChange>,
    pub(crate) apply_error: Option<String>,
    pub(crate) applying: bool,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `from → to` for one field of one bug, collapsing no-op edits.
    fn stage_field<T>(
        &mut self,
        id: BugId,
        field: &'static str,
        slot: fn(&mut StagedChange) -> &mut Option<FieldChange<T>>,
        from: T,
        to: T,
    ) where
        T: PartialEq + fmt::Debug,
    {
        let entry = self.changes.entry(id).or_default();
        let current = slot(entry);

        // The first recorded `from` is the bug's original value.
        let from = match current.take() {
            Some(existing) => existing.from,
            None => from,
        };

        if from == to {
            debug!(bug = %id, field, "edit returns to original value, unstaging field");
        } else {
            debug!(bug = %id, field, ?from, ?to, "staging edit");
            *current = Some(FieldChange { from, to });
        }

        if entry.is_empty() {
            self.changes.shift_remove(&id);
        }
    }

    /// Stage a column move
    pub fn stage_change(&mut self, id: BugId, from: Column, to: Column) {
        self.stage_field(id, "status", |c| &mut c.status, from, to);
    }

    pub fn stage_assignee_change(
        &mut self,
        id: BugId,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        self.stage_field(id, "assignee", |c| &mut c.assignee, from.into(), to.into());
    }

    pub fn stage_whiteboard_change(
        &mut self,
        id: BugId,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        self.stage_field(id, "whiteboard", |c| &mut c.whiteboard, from.into(), to.into());
    }

    /// Stage a points edit; `None` means no points
    pub fn stage_points_change(&mut self, id: BugId, from: Option<Points>, to: Option<Points>) {
        self.stage_field(id, "points", |c| &mut c.points, from, to);
    }

    pub fn stage_priority_change(&mut self, id: BugId, from: Priority, to: Priority) {
        self.stage_field(id, "priority", |c| &mut c.priority, from, to);
    }

    pub fn stage_severity_change(
        &mut self,
        id: BugId,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        self.stage_field(id, "severity", |c| &mut c.severity, from.into(), to.into());
    }

    pub fn stage_qe_verify_change(&mut self, id: BugId, from: QeVerifyStatus, to: QeVerifyStatus) {
        self.stage_field(id, "qe_verify", |c| &mut c.qe_verify, from, to);
    }

    // -- Staging from a bug snapshot --

    /// Stage moving a bug to `to`, from the column it is currently placed in.
    ///
    /// A resolved bug sits in in-testing only while it carries `qe-verify+`,
    /// so the move also edits that flag: moving into in-testing sets it,
    /// moving into done clears a pending `+`, and moving on from either of
    /// those staged targets puts the flag back to the snapshot value.
    pub fn stage_move(&mut self, bug: &Bug, to: Column) {
        let previous = self
            .get(bug.id)
            .and_then(|c| c.status.as_ref())
            .map(|s| s.to);
        self.stage_change(bug.id, assign_column(bug), to);
        let moving = self.get(bug.id).is_some_and(|c| c.status.is_some());

        let qe_verify = match to {
            Column::InTesting if moving => Some(QeVerifyStatus::Plus),
            Column::Done if moving && self.pending_qe_verify(bug) == QeVerifyStatus::Plus => {
                Some(QeVerifyStatus::Unknown)
            }
            _ if matches!(previous, Some(Column::InTesting | Column::Done)) => {
                Some(bug.qe_verify())
            }
            _ => None,
        };
        if let Some(qe_verify) = qe_verify {
            self.stage_qe_verify(bug, qe_verify);
        }
    }

    fn pending_qe_verify(&self, bug: &Bug) -> QeVerifyStatus {
        self.get(bug.id)
            .and_then(|c| c.qe_verify.as_ref())
            .map(|q| q.to)
            .unwrap_or_else(|| bug.qe_verify())
    }

    pub fn stage_assignee(&mut self, bug: &Bug, to: impl Into<String>) {
        self.stage_assignee_change(bug.id, bug.assigned_to.clone(), to);
    }

    pub fn stage_whiteboard(&mut self, bug: &Bug, to: impl Into<String>) {
        self.stage_whiteboard_change(bug.id, bug.whiteboard.clone(), to);
    }

    /// Stage adding or removing the sprint tag, on top of any pending whiteboard edit
    pub fn stage_sprint(&mut self, bug: &Bug, in_sprint: bool) {
        let current = self
            .get(bug.id)
            .and_then(|c| c.whiteboard.as_ref())
            .map(|w| w.to.clone())
            .unwrap_or_else(|| bug.whiteboard.clone());
        let to = if in_sprint {
            add_sprint_tag(&current)
        } else {
            remove_sprint_tag(&current)
        };
        self.stage_whiteboard(bug, to);
    }

    pub fn stage_points(&mut self, bug: &Bug, to: Option<Points>) {
        self.stage_points_change(bug.id, bug.points.clone(), to);
    }

    pub fn stage_priority(&mut self, bug: &Bug, to: Priority) {
        self.stage_priority_change(bug.id, bug.priority, to);
    }

    pub fn stage_severity(&mut self, bug: &Bug, to: impl Into<String>) {
        self.stage_severity_change(bug.id, bug.severity.clone(), to);
    }

    pub fn stage_qe_verify(&mut self, bug: &Bug, to: QeVerifyStatus) {
        self.stage_qe_verify_change(bug.id, bug.qe_verify(), to);
    }

    // -- Removal --

    /// Drop every pending edit for one bug. Unknown ids are ignored.
    pub fn unstage_change(&mut self, id: BugId) {
        if self.changes.shift_remove(&id).is_some() {
            debug!(bug = %id, "unstaged all edits");
        }
    }

    /// Drop everything, including the last apply error
    pub fn clear_all_changes(&mut self) {
        self.changes.clear();
        self.apply_error = None;
    }

    // -- Queries --

    /// Number of bugs with pending edits
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Pending edits for one bug
    pub fn get(&self, id: BugId) -> Option<&StagedChange> {
        self.changes.get(&id)
    }

    pub fn is_staged(&self, id: BugId) -> bool {
        self.changes.contains_key(&id)
    }

    /// Read-only view of all pending edits, in staging order
    pub fn changes(&self) -> &IndexMap<BugId, StagedChange> {
        &self.changes
    }

    /// Message describing the last failed apply, if any
    pub fn apply_error(&self) -> Option<&str> {
        self.apply_error.as_deref()
    }

    /// Whether an apply pass is running
    pub fn is_applying(&self) -> bool {
        self.applying
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprint_tag::SPRINT_TAG;
    use crate::types::{BugStatus, Flag, FlagStatus, QE_VERIFY_FLAG};

    fn id(n: u64) -> BugId {
        BugId::new(n).unwrap()
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert_eq!(ledger.change_count(), 0);
        assert!(!ledger.has_changes());
        assert!(ledger.apply_error().is_none());
        assert!(!ledger.is_applying());
    }

    #[test]
    fn test_stage_change_records_from_and_to() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);

        let change = ledger.get(id(1)).unwrap();
        assert_eq!(
            change.status,
            Some(FieldChange {
                from: Column::Backlog,
                to: Column::Todo
            })
        );
        assert_eq!(change.field_count(), 1);
    }

    #[test]
    fn test_staging_same_value_creates_nothing() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Todo, Column::Todo);
        ledger.stage_priority_change(id(2), Priority::P3, Priority::P3);
        ledger.stage_points_change(id(3), None, None);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_collapse_removes_entry() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);
        ledger.stage_change(id(1), Column::Backlog, Column::Backlog);
        assert!(ledger.get(id(1)).is_none());
        assert_eq!(ledger.change_count(), 0);
    }

    #[test]
    fn test_collapse_keeps_other_fields() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);
        ledger.stage_priority_change(id(1), Priority::P3, Priority::P1);
        ledger.stage_change(id(1), Column::Backlog, Column::Backlog);

        let change = ledger.get(id(1)).unwrap();
        assert!(change.status.is_none());
        assert_eq!(
            change.priority,
            Some(FieldChange {
                from: Priority::P3,
                to: Priority::P1
            })
        );
    }

    #[test]
    fn test_collapse_for_every_field() {
        let mut ledger = Ledger::new();
        let bug = id(4);

        ledger.stage_assignee_change(bug, "a@example.com", "b@example.com");
        ledger.stage_assignee_change(bug, "a@example.com", "a@example.com");
        ledger.stage_whiteboard_change(bug, "", SPRINT_TAG);
        ledger.stage_whiteboard_change(bug, "", "");
        ledger.stage_points_change(bug, None, Some(Points::Number(3.0)));
        ledger.stage_points_change(bug, None, None);
        ledger.stage_severity_change(bug, "S3", "S1");
        ledger.stage_severity_change(bug, "S3", "S3");
        ledger.stage_qe_verify_change(bug, QeVerifyStatus::Unknown, QeVerifyStatus::Plus);
        ledger.stage_qe_verify_change(bug, QeVerifyStatus::Unknown, QeVerifyStatus::Unknown);

        assert!(!ledger.is_staged(bug));
    }

    #[test]
    fn test_fields_are_independent() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::InProgress);
        ledger.stage_priority_change(id(1), Priority::P3, Priority::P2);
        ledger.stage_severity_change(id(1), "S3", "S2");
        ledger.stage_priority_change(id(1), Priority::P3, Priority::P1);

        let change = ledger.get(id(1)).unwrap();
        assert_eq!(change.status.as_ref().unwrap().to, Column::InProgress);
        assert_eq!(change.severity.as_ref().unwrap().to, "S2");
        assert_eq!(change.priority.as_ref().unwrap().to, Priority::P1);
        assert_eq!(change.field_count(), 3);
    }

    #[test]
    fn test_restaging_keeps_original_from() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);
        ledger.stage_change(id(1), Column::Todo, Column::InProgress);

        let status = ledger.get(id(1)).unwrap().status.clone().unwrap();
        assert_eq!(status.from, Column::Backlog);
        assert_eq!(status.to, Column::InProgress);

        // Moving back to the original column collapses, whatever `from` the caller passes.
        ledger.stage_change(id(1), Column::InProgress, Column::Backlog);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_idempotent_restage() {
        let mut once = Ledger::new();
        once.stage_change(id(1), Column::Backlog, Column::Todo);

        let mut twice = Ledger::new();
        twice.stage_change(id(1), Column::Backlog, Column::Todo);
        twice.stage_change(id(1), Column::Backlog, Column::Todo);

        assert_eq!(once.changes(), twice.changes());
    }

    #[test]
    fn test_count_is_per_bug() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);
        ledger.stage_priority_change(id(1), Priority::P3, Priority::P1);
        ledger.stage_severity_change(id(1), "S3", "S1");
        ledger.stage_change(id(2), Column::Todo, Column::Done);
        assert_eq!(ledger.change_count(), 2);
        assert!(ledger.has_changes());
    }

    #[test]
    fn test_staging_order_is_preserved() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(9), Column::Backlog, Column::Todo);
        ledger.stage_change(id(2), Column::Backlog, Column::Todo);
        ledger.stage_change(id(5), Column::Backlog, Column::Todo);
        ledger.stage_priority_change(id(9), Priority::P3, Priority::P1);

        let order: Vec<u64> = ledger.changes().keys().map(|k| k.get()).collect();
        assert_eq!(order, vec![9, 2, 5]);
    }

    #[test]
    fn test_unstage_change() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);
        ledger.stage_priority_change(id(1), Priority::P3, Priority::P1);
        ledger.unstage_change(id(1));
        assert!(!ledger.has_changes());

        // Unknown ids are a no-op
        ledger.unstage_change(id(42));
        assert_eq!(ledger.change_count(), 0);
    }

    #[test]
    fn test_clear_all_changes_clears_error() {
        let mut ledger = Ledger::new();
        ledger.stage_change(id(1), Column::Backlog, Column::Todo);
        ledger.apply_error = Some("1 of 1 updates failed".into());

        ledger.clear_all_changes();
        assert!(!ledger.has_changes());
        assert!(ledger.apply_error().is_none());
    }

    #[test]
    fn test_stage_move_sources_from_snapshot() {
        let bug = Bug::new(id(1), BugStatus::New).with_whiteboard(SPRINT_TAG);
        let mut ledger = Ledger::new();
        ledger.stage_move(&bug, Column::Done);

        let status = ledger.get(id(1)).unwrap().status.clone().unwrap();
        assert_eq!(status.from, Column::Todo);
        assert_eq!(status.to, Column::Done);

        ledger.stage_move(&bug, Column::Todo);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_stage_move_to_in_testing_requests_qe_verify() {
        let bug = Bug::new(id(1), BugStatus::InProgress);
        let mut ledger = Ledger::new();
        ledger.stage_move(&bug, Column::InTesting);

        let change = ledger.get(id(1)).unwrap();
        assert_eq!(change.status.as_ref().unwrap().to, Column::InTesting);
        let qe = change.qe_verify.clone().unwrap();
        assert_eq!(qe.from, QeVerifyStatus::Unknown);
        assert_eq!(qe.to, QeVerifyStatus::Plus);

        // Moving on drops the flag edit the in-testing move made.
        ledger.stage_move(&bug, Column::Done);
        let change = ledger.get(id(1)).unwrap();
        assert_eq!(change.status.as_ref().unwrap().to, Column::Done);
        assert!(change.qe_verify.is_none());

        ledger.stage_move(&bug, Column::InProgress);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_stage_move_out_of_testing_clears_qe_verify() {
        let bug = Bug::new(id(1), BugStatus::Resolved)
            .with_resolution("FIXED")
            .with_flag(Flag::new(QE_VERIFY_FLAG, FlagStatus::Granted));
        let mut ledger = Ledger::new();

        ledger.stage_move(&bug, Column::Done);
        let qe = ledger.get(id(1)).unwrap().qe_verify.clone().unwrap();
        assert_eq!(qe.from, QeVerifyStatus::Plus);
        assert_eq!(qe.to, QeVerifyStatus::Unknown);

        ledger.stage_move(&bug, Column::InTesting);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_stage_move_to_current_column_leaves_flags_alone() {
        let bug = Bug::new(id(1), BugStatus::Verified)
            .with_flag(Flag::new(QE_VERIFY_FLAG, FlagStatus::Granted));
        let mut ledger = Ledger::new();
        ledger.stage_move(&bug, Column::Done);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_stage_sprint_builds_on_pending_whiteboard() {
        let bug = Bug::new(id(1), BugStatus::New).with_whiteboard("[perf]");
        let mut ledger = Ledger::new();

        ledger.stage_sprint(&bug, true);
        let wb = ledger.get(id(1)).unwrap().whiteboard.clone().unwrap();
        assert_eq!(wb.from, "[perf]");
        assert_eq!(wb.to, "[perf] [bzkanban-sprint]");

        ledger.stage_sprint(&bug, false);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_stage_qe_verify_from_flags() {
        let bug = Bug::new(id(1), BugStatus::Resolved)
            .with_flag(Flag::new(QE_VERIFY_FLAG, FlagStatus::Granted));
        let mut ledger = Ledger::new();

        ledger.stage_qe_verify(&bug, QeVerifyStatus::Unknown);
        let qe = ledger.get(id(1)).unwrap().qe_verify.clone().unwrap();
        assert_eq!(qe.from, QeVerifyStatus::Plus);
        assert_eq!(qe.to, QeVerifyStatus::Unknown);

        ledger.stage_qe_verify(&bug, QeVerifyStatus::Plus);
        assert!(!ledger.has_changes());
    }

    #[test]
    fn test_points_value_equality() {
        let bug = Bug::new(id(1), BugStatus::New).with_points(Points::parse("3"));
        let mut ledger = Ledger::new();
        ledger.stage_points(&bug, Some(Points::Number(3.0)));
        assert!(!ledger.has_changes());

        ledger.stage_points(&bug, None);
        let points = ledger.get(id(1)).unwrap().points.clone().unwrap();
        assert_eq!(points.to, None);
    }
}
