//! Errors surfaced by the remote bug tracker client

use thiserror::Error;

/// Errors from talking to the remote tracker.
///
/// The reconciler does not branch on these; every variant becomes a
/// per-bug failure message and the bug stays staged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// 401 from the tracker
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 404 from the tracker
    #[error("Not Found")]
    NotFound,

    /// Any other non-success status; the server's message is passed through
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport failure before a response arrived
    #[error("{0}")]
    Network(String),

    /// The request exceeded the client timeout
    #[error("Request timed out after {secs} seconds")]
    Timeout { secs: f64 },

    /// The response body could not be decoded
    #[error("Invalid response from server: {0}")]
    Decode(String),
}
