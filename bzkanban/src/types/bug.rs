//! Bug types: Bug, BugStatus, Priority, Points, Flag

use super::ids::BugId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Name of the verification flag that gates the in-testing column
pub const QE_VERIFY_FLAG: &str = "qe-verify";

/// Lifecycle status reported by the remote tracker.
///
/// Parsing is total: statuses this crate does not know about are kept
/// verbatim in `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BugStatus {
    Unconfirmed,
    New,
    Assigned,
    InProgress,
    Reopened,
    Resolved,
    Verified,
    Closed,
    Other(String),
}

impl BugStatus {
    /// Parse a remote status, ignoring case
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNCONFIRMED" => Self::Unconfirmed,
            "NEW" => Self::New,
            "ASSIGNED" => Self::Assigned,
            "IN_PROGRESS" => Self::InProgress,
            "REOPENED" => Self::Reopened,
            "RESOLVED" => Self::Resolved,
            "VERIFIED" => Self::Verified,
            "CLOSED" => Self::Closed,
            _ => Self::Other(s.to_string()),
        }
    }

    /// The status as the remote tracker spells it
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unconfirmed => "UNCONFIRMED",
            Self::New => "NEW",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Reopened => "REOPENED",
            Self::Resolved => "RESOLVED",
            Self::Verified => "VERIFIED",
            Self::Closed => "CLOSED",
            Self::Other(s) => s,
        }
    }

    /// Whether the tracker requires a resolution alongside this status
    pub fn requires_resolution(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl From<String> for BugStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<BugStatus> for String {
    fn from(status: BugStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bug priority, `P1` (highest) to `P5`, or unset (`--` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
    P5,
    #[default]
    Unknown,
}

impl Priority {
    /// Parse a priority; anything outside `P1..P5` is `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Self::P1,
            "P2" => Self::P2,
            "P3" => Self::P3,
            "P4" => Self::P4,
            "P5" => Self::P5,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::P5 => "P5",
            Self::Unknown => "--",
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Story points. The tracker stores them in a text field, so both numbers
/// and free text occur. Numeric strings are normalized to `Number` so that
/// `"3"` and `3` compare equal. They are written back as text, in the same
/// form [`fmt::Display`] gives (`3`, `0.5`).
#[derive(Debug, Clone, PartialEq)]
pub enum Points {
    Number(f64),
    Text(String),
}

impl Points {
    /// Parse user or remote input into points
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(trimmed.to_string()),
        }
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Points::Number(n),
            Raw::Text(s) => Points::parse(&s),
        })
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Points::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Points::Number(n) => write!(f, "{}", n),
            Points::Text(s) => f.write_str(s),
        }
    }
}

/// Status character of a tracker flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagStatus {
    #[serde(rename = "?")]
    Requested,
    #[serde(rename = "-")]
    Denied,
    #[serde(rename = "+")]
    Granted,
}

/// A named flag on a bug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    pub status: FlagStatus,
}

impl Flag {
    pub fn new(name: impl Into<String>, status: FlagStatus) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }
}

/// Tri-state view of the `qe-verify` flag.
///
/// `Unknown` also covers a requested (`?`) flag: only an explicit `+` or `-`
/// is treated as a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QeVerifyStatus {
    #[default]
    Unknown,
    Minus,
    Plus,
}

impl QeVerifyStatus {
    /// The flag status the tracker expects; `X` clears the flag
    pub fn flag_value(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Unknown => "X",
        }
    }

    /// Parse `plus`/`minus`/`unknown` or the flag characters; anything else is `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "plus" | "+" => Self::Plus,
            "minus" | "-" => Self::Minus,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for QeVerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Unknown => "unknown",
        })
    }
}

/// A bug as returned by the remote tracker. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bug {
    pub id: BugId,
    #[serde(default)]
    pub summary: String,
    pub status: BugStatus,
    /// Empty resolutions from the tracker are read as `None`
    #[serde(default, deserialize_with = "empty_as_none")]
    pub resolution: Option<String>,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub whiteboard: String,
    #[serde(default, rename = "cf_fx_points")]
    pub points: Option<Points>,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub last_change_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flags: Vec<Flag>,
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl Bug {
    /// Create a bug with the given id and status and everything else empty
    pub fn new(id: BugId, status: BugStatus) -> Self {
        Self {
            id,
            summary: String::new(),
            status,
            resolution: None,
            assigned_to: String::new(),
            priority: Priority::Unknown,
            severity: String::new(),
            whiteboard: String::new(),
            points: None,
            product: String::new(),
            component: String::new(),
            last_change_time: None,
            flags: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    pub fn with_whiteboard(mut self, whiteboard: impl Into<String>) -> Self {
        self.whiteboard = whiteboard.into();
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = assignee.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_points(mut self, points: Points) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Find a flag by name
    pub fn flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// Current state of the `qe-verify` flag
    pub fn qe_verify(&self) -> QeVerifyStatus {
        match self.flag(QE_VERIFY_FLAG).map(|f| f.status) {
            Some(FlagStatus::Granted) => QeVerifyStatus::Plus,
            Some(FlagStatus::Denied) => QeVerifyStatus::Minus,
            _ => QeVerifyStatus::Unknown,
        }
    }
}
