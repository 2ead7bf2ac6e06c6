//! Bug identifier newtype

use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a bug in the remote tracker. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct BugId(u64);

impl BugId {
    /// Create an id, rejecting zero
    pub fn new(id: u64) -> Result<Self> {
        if id == 0 {
            return Err(BoardError::invalid_value("id", "bug ids are positive"));
        }
        Ok(Self(id))
    }

    /// The raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for BugId {
    type Error = BoardError;

    fn try_from(id: u64) -> Result<Self> {
        Self::new(id)
    }
}

impl From<BugId> for u64 {
    fn from(id: BugId) -> Self {
        id.0
    }
}

impl FromStr for BugId {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('#');
        let id = trimmed
            .parse::<u64>()
            .map_err(|_| BoardError::invalid_value("id", format!("'{}' is not a bug id", s)))?;
        Self::new(id)
    }
}

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
