//! Request and response types for the remote tracker

use crate::types::{Bug, BugId, BugStatus, Points, Priority};
use serde::{Deserialize, Serialize};

/// Query filters for listing bugs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BugFilters {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<BugId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<BugStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl BugFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: BugId) -> Self {
        self.ids.push(id);
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_status(mut self, status: BugStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in the tracker's search syntax
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        for id in &self.ids {
            query.push(("id", id.to_string()));
        }
        if let Some(product) = &self.product {
            query.push(("product", product.clone()));
        }
        if let Some(component) = &self.component {
            query.push(("component", component.clone()));
        }
        for status in &self.statuses {
            query.push(("bug_status", status.to_string()));
        }
        if let Some(assignee) = &self.assigned_to {
            query.push(("assigned_to", assignee.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// Flag change inside an update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagUpdate {
    pub name: String,
    /// `+`, `-`, `?`, or `X` to clear the flag
    pub status: String,
}

/// Partial update for one bug. Only present fields are sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BugUpdate {
    pub id: BugId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BugStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whiteboard: Option<String>,
    /// Outer `None` means untouched; `Some(None)` clears the points
    #[serde(
        default,
        rename = "cf_fx_points",
        skip_serializing_if = "Option::is_none"
    )]
    pub points: Option<Option<Points>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<FlagUpdate>>,
}

impl BugUpdate {
    /// An update that changes nothing yet
    pub fn new(id: BugId) -> Self {
        Self {
            id,
            status: None,
            resolution: None,
            assigned_to: None,
            whiteboard: None,
            points: None,
            priority: None,
            severity: None,
            flags: None,
        }
    }
}

/// One bug that failed to update, with the reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedUpdate {
    pub id: BugId,
    pub error: String,
}

/// Per-bug outcome of a batch of updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub successful: Vec<BugId>,
    pub failed: Vec<FailedUpdate>,
}

/// Body of `GET /rest/bug`
#[derive(Debug, Deserialize)]
pub(crate) struct BugListResponse {
    #[serde(default)]
    pub bugs: Vec<Bug>,
}
