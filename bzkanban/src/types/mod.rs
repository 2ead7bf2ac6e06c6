//! Core types for the board engine

mod bug;
mod column;
mod ids;

// Re-export all types
pub use bug::{Bug, BugStatus, Flag, FlagStatus, Points, Priority, QeVerifyStatus, QE_VERIFY_FLAG};
pub use column::Column;
pub use ids::BugId;
