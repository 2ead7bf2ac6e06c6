//! Kanban board engine over a remote bug tracker
//!
//! Bugs live in a Bugzilla instance. This crate places them on a five-column
//! board, lets edits pile up locally, and commits them back in one batch.
//!
//! ## Overview
//!
//! - **Derived columns** - A bug's column is computed from its status, resolution,
//!   `qe-verify` flag, and whiteboard sprint tag; it is never stored
//! - **Staged edits** - Moves and field edits go into a [`Ledger`] first. Editing a
//!   field back to its original value unstages it
//! - **Batch apply** - [`Ledger::apply_changes`] sends one update per bug,
//!   sequentially. Bugs the tracker rejects stay staged for a retry
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use bzkanban::{BugFilters, BugTracker, BugzillaClient, Column, Ledger, Priority};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BugzillaClient::new("https://bugzilla.mozilla.org")?;
//! let bugs = client
//!     .get_bugs("api-key", &BugFilters::new().with_product("Firefox"))
//!     .await?;
//!
//! let mut ledger = Ledger::new();
//! ledger.stage_move(&bugs[0], Column::Todo);
//! ledger.stage_priority(&bugs[0], Priority::P1);
//!
//! let result = ledger.apply_changes(&client, "api-key").await?;
//! println!("{} applied, {} failed", result.success_count, result.fail_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Columns
//!
//! ```text
//! backlog → todo → in-progress → in-testing → done
//! ```
//!
//! [`mapper`] holds the plain status table; [`rules::assign_column`] is what the
//! board actually uses.

pub mod board;
pub mod config;
mod error;
pub mod ledger;
pub mod mapper;
pub mod reconciler;
pub mod remote;
pub mod rules;
pub mod sprint_tag;
pub mod types;

pub use board::{Board, Card, ColumnView};
pub use config::{BoardConfig, ConfigError, ConfigLoader};
pub use error::{BoardError, Result};
pub use ledger::{FieldChange, Ledger, StagedChange};
pub use reconciler::ApplyResult;
pub use remote::{BatchOutcome, BugFilters, BugTracker, BugUpdate, BugzillaClient, RemoteError};
pub use rules::{assign_column, has_qe_verify_flag};

// Re-export commonly used types
pub use types::{Bug, BugId, BugStatus, Column, Flag, FlagStatus, Points, Priority, QeVerifyStatus};
