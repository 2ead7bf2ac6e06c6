//! Committing the ledger to the remote tracker.
//!
//! One apply pass turns every staged bug into a [`BugUpdate`], hands the
//! batch to the tracker, then removes the bugs that were updated. Failed bugs
//! stay staged untouched so the same apply can simply be retried. Tracker
//! failures never escape as errors; they end up in the [`ApplyResult`] and
//! the ledger's apply error.

use crate::error::{BoardError, Result};
use crate::ledger::{Ledger, StagedChange};
use crate::mapper::remote_status;
use crate::remote::{BatchOutcome, BugTracker, BugUpdate, FlagUpdate};
use crate::rules::FIXED;
use crate::types::{BugId, QE_VERIFY_FLAG};
use serde::Serialize;
use tracing::{info, warn};

/// Counts from one apply pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    pub success_count: usize,
    pub fail_count: usize,
}

impl ApplyResult {
    pub fn is_complete_success(&self) -> bool {
        self.fail_count == 0
    }
}

/// Build the tracker update for one bug's staged edits.
///
/// Only staged fields are set. A move to a column whose status is
/// `RESOLVED` also sets the resolution to `FIXED`, which the tracker
/// requires. A qe-verify edit becomes a single `qe-verify` flag change,
/// with `X` clearing the flag.
pub fn build_update(id: BugId, change: &StagedChange) -> BugUpdate {
    let mut update = BugUpdate::new(id);

    if let Some(status) = &change.status {
        let target = remote_status(status.to);
        if target.requires_resolution() {
            update.resolution = Some(FIXED.to_string());
        }
        update.status = Some(target);
    }
    if let Some(assignee) = &change.assignee {
        update.assigned_to = Some(assignee.to.clone());
    }
    if let Some(whiteboard) = &change.whiteboard {
        update.whiteboard = Some(whiteboard.to.clone());
    }
    if let Some(points) = &change.points {
        update.points = Some(points.to.clone());
    }
    if let Some(priority) = &change.priority {
        update.priority = Some(priority.to);
    }
    if let Some(severity) = &change.severity {
        update.severity = Some(severity.to.clone());
    }
    if let Some(qe_verify) = &change.qe_verify {
        update.flags = Some(vec![FlagUpdate {
            name: QE_VERIFY_FLAG.to_string(),
            status: qe_verify.to.flag_value().to_string(),
        }]);
    }

    update
}

/// Build updates for every staged bug, in staging order
pub fn build_updates(ledger: &Ledger) -> Vec<BugUpdate> {
    ledger
        .changes()
        .iter()
        .map(|(id, change)| build_update(*id, change))
        .collect()
}

/// Summarize failed updates for the user
fn failure_message(outcome: &BatchOutcome) -> String {
    let details = outcome
        .failed
        .iter()
        .map(|f| format!("#{}: {}", f.id, f.error))
        .collect::<Vec<_>>()
        .join("; ");

    if outcome.successful.is_empty() {
        format!(
            "No changes were applied: all {} updates failed ({})",
            outcome.failed.len(),
            details
        )
    } else {
        format!(
            "{} of {} updates failed ({})",
            outcome.failed.len(),
            outcome.failed.len() + outcome.successful.len(),
            details
        )
    }
}

/// Holds the ledger's applying flag for the duration of one pass. The flag
/// is cleared on drop, so an abandoned apply future does not leave it set.
struct ApplyingGuard<'a>(&'a mut bool);

impl<'a> ApplyingGuard<'a> {
    fn set(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl Ledger {
    /// Commit every staged edit to the tracker.
    ///
    /// Returns immediately with zero counts, and without contacting the
    /// tracker, when nothing is staged. An empty credential is rejected
    /// before anything changes. Otherwise this never fails: per-bug
    /// failures are counted and kept staged, and a failure of the whole
    /// pass leaves the ledger exactly as it was. In both cases
    /// [`Ledger::apply_error`] describes what went wrong.
    ///
    /// Taking `&mut self` rules out staging or a second apply while the
    /// pass is in flight.
    pub async fn apply_changes<T>(&mut self, tracker: &T, credential: &str) -> Result<ApplyResult>
    where
        T: BugTracker + ?Sized,
    {
        if self.changes.is_empty() {
            return Ok(ApplyResult::default());
        }
        if credential.trim().is_empty() {
            return Err(BoardError::EmptyCredential);
        }

        let updates = build_updates(self);
        self.apply_error = None;
        info!(count = updates.len(), "applying staged changes");

        let outcome = {
            let _applying = ApplyingGuard::set(&mut self.applying);
            tracker.batch_update(credential, &updates).await
        };

        let result = match outcome {
            Ok(outcome) => self.reconcile(&outcome),
            Err(e) => {
                warn!(error = %e, "apply failed before any update completed");
                self.apply_error = Some(e.to_string());
                ApplyResult {
                    success_count: 0,
                    fail_count: updates.len(),
                }
            }
        };

        info!(
            success = result.success_count,
            failed = result.fail_count,
            "apply finished"
        );
        Ok(result)
    }

    /// Drop the bugs the tracker accepted and record any failures
    fn reconcile(&mut self, outcome: &BatchOutcome) -> ApplyResult {
        for id in &outcome.successful {
            self.changes.shift_remove(id);
        }

        if !outcome.failed.is_empty() {
            let message = failure_message(outcome);
            warn!("{}", message);
            self.apply_error = Some(message);
        }

        ApplyResult {
            success_count: outcome.successful.len(),
            fail_count: outcome.failed.len(),
        }
    }
}
