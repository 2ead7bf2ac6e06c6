//! Board view: bugs grouped into columns with staged edits overlaid.
//!
//! Staged bugs are shown as they will look once applied, and stay marked
//! as staged until the tracker accepts them.

use crate::ledger::{Ledger, StagedChange};
use crate::mapper::remote_status;
use crate::rules::{assign_column, FIXED};
use crate::types::{Bug, Column, Flag, FlagStatus, QeVerifyStatus, QE_VERIFY_FLAG};
use serde::Serialize;

impl StagedChange {
    /// Preview of `bug` with these edits applied
    pub fn apply_to(&self, bug: &Bug) -> Bug {
        let mut preview = bug.clone();

        if let Some(status) = &self.status {
            let target = remote_status(status.to);
            preview.resolution = if target.requires_resolution() {
                Some(FIXED.to_string())
            } else {
                None
            };
            preview.status = target;
        }
        if let Some(assignee) = &self.assignee {
            preview.assigned_to = assignee.to.clone();
        }
        if let Some(whiteboard) = &self.whiteboard {
            preview.whiteboard = whiteboard.to.clone();
        }
        if let Some(points) = &self.points {
            preview.points = points.to.clone();
        }
        if let Some(priority) = &self.priority {
            preview.priority = priority.to;
        }
        if let Some(severity) = &self.severity {
            preview.severity = severity.to.clone();
        }
        if let Some(qe_verify) = &self.qe_verify {
            preview.flags.retain(|f| f.name != QE_VERIFY_FLAG);
            let status = match qe_verify.to {
                QeVerifyStatus::Plus => Some(FlagStatus::Granted),
                QeVerifyStatus::Minus => Some(FlagStatus::Denied),
                QeVerifyStatus::Unknown => None,
            };
            if let Some(status) = status {
                preview.flags.push(Flag::new(QE_VERIFY_FLAG, status));
            }
        }

        preview
    }
}

/// A bug as displayed on the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    /// The bug with staged edits applied
    pub bug: Bug,
    /// Whether the bug has unapplied edits
    pub staged: bool,
}

/// One column and its cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub column: Column,
    pub cards: Vec<Card>,
}

/// The whole board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub columns: Vec<ColumnView>,
}

/// Column a bug is displayed in once its staged edits are taken into account.
///
/// A staged move wins outright; otherwise the placement rules run on the
/// previewed bug, so e.g. staging the sprint tag pulls a bug into todo.
pub fn place(bug: &Bug, ledger: &Ledger) -> Column {
    match ledger.get(bug.id) {
        Some(change) => match &change.status {
            Some(status) => status.to,
            None => assign_column(&change.apply_to(bug)),
        },
        None => assign_column(bug),
    }
}

impl Board {
    /// Group bugs into columns, keeping the input order within each column
    pub fn build(bugs: &[Bug], ledger: &Ledger) -> Self {
        let mut columns: Vec<ColumnView> = Column::ALL
            .iter()
            .map(|column| ColumnView {
                column: *column,
                cards: Vec::new(),
            })
            .collect();

        for bug in bugs {
            let column = place(bug, ledger);
            let card = match ledger.get(bug.id) {
                Some(change) => Card {
                    bug: change.apply_to(bug),
                    staged: true,
                },
                None => Card {
                    bug: bug.clone(),
                    staged: false,
                },
            };
            // Column::ALL is in declaration order, so the discriminant is the index.
            columns[column as usize].cards.push(card);
        }

        Self { columns }
    }

    /// Cards in one column
    pub fn column(&self, column: Column) -> &[Card] {
        &self.columns[column as usize].cards
    }

    /// Total number of cards
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}
