//! Board columns

use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A board column. Columns are never stored; they are derived from bug state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Column {
    Backlog,
    Todo,
    InProgress,
    InTesting,
    Done,
}

impl Column {
    /// All columns in display order
    pub const ALL: [Column; 5] = [
        Column::Backlog,
        Column::Todo,
        Column::InProgress,
        Column::InTesting,
        Column::Done,
    ];

    /// The column identifier as used on the wire and in URLs
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Backlog => "backlog",
            Column::Todo => "todo",
            Column::InProgress => "in-progress",
            Column::InTesting => "in-testing",
            Column::Done => "done",
        }
    }

    /// Human-readable column title
    pub fn title(self) -> &'static str {
        match self {
            Column::Backlog => "Backlog",
            Column::Todo => "To Do",
            Column::InProgress => "In Progress",
            Column::InTesting => "In Testing",
            Column::Done => "Done",
        }
    }
}

impl FromStr for Column {
    type Err = BoardError;

    /// Case-sensitive: `"Todo"` is not a column.
    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| BoardError::unknown_column(s))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_display() {
        for column in Column::ALL {
            assert_eq!(column.as_str().parse::<Column>().unwrap(), column);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!(
            "Todo".parse::<Column>(),
            Err(BoardError::UnknownColumn { .. })
        ));
        assert!("archive".parse::<Column>().is_err());
    }

    #[test]
    fn test_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Column::InTesting).unwrap(),
            "\"in-testing\""
        );
    }

    #[test]
    fn test_order() {
        assert!(Column::Backlog < Column::Done);
        assert_eq!(Column::ALL[2], Column::InProgress);
    }
}
