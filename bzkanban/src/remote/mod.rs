//! Remote bug tracker: client trait, Bugzilla REST implementation, and wire types.

pub mod client;
pub mod error;
pub mod types;

pub use client::{BugzillaClient, API_KEY_HEADER, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::RemoteError;
pub use types::{BatchOutcome, BugFilters, BugUpdate, FailedUpdate, FlagUpdate};

use crate::types::Bug;
use async_trait::async_trait;
use tracing::{debug, warn};

/// The system of record for bugs.
#[async_trait]
pub trait BugTracker: Send + Sync {
    /// List bugs matching the filters
    async fn get_bugs(&self, credential: &str, filters: &BugFilters)
        -> Result<Vec<Bug>, RemoteError>;

    /// Apply one partial update. Succeeds or fails as a whole.
    async fn update_bug(&self, credential: &str, update: &BugUpdate) -> Result<(), RemoteError>;

    /// Apply a batch of updates, reporting the outcome per bug.
    ///
    /// Updates are sent one at a time, each awaited before the next, so at
    /// most one request is outstanding. This keeps the tracker's rate
    /// limiter quiet at the cost of latency. A failing update does not stop
    /// the ones after it.
    ///
    /// An `Err` means the whole pass failed before any per-bug result was
    /// known.
    async fn batch_update(
        &self,
        credential: &str,
        updates: &[BugUpdate],
    ) -> Result<BatchOutcome, RemoteError> {
        let mut outcome = BatchOutcome::default();

        for update in updates {
            match self.update_bug(credential, update).await {
                Ok(()) => {
                    debug!(bug = %update.id, "bug updated");
                    outcome.successful.push(update.id);
                }
                Err(e) => {
                    warn!(bug = %update.id, error = %e, "bug update failed");
                    outcome.failed.push(FailedUpdate {
                        id: update.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BugId;
    use std::sync::Mutex;

    /// Records the order of calls and fails the configured ids
    struct Recorder {
        fail: Vec<u64>,
        calls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl BugTracker for Recorder {
        async fn get_bugs(&self, _: &str, _: &BugFilters) -> Result<Vec<Bug>, RemoteError> {
            Ok(Vec::new())
        }

        async fn update_bug(&self, _: &str, update: &BugUpdate) -> Result<(), RemoteError> {
            self.calls.lock().unwrap().push(update.id.get());
            if self.fail.contains(&update.id.get()) {
                Err(RemoteError::NotFound)
            } else {
                Ok(())
            }
        }
    }

    fn updates(ids: &[u64]) -> Vec<BugUpdate> {
        ids.iter()
            .map(|n| BugUpdate::new(BugId::new(*n).unwrap()))
            .collect()
    }

    #[tokio::test]
    async fn test_batch_update_is_sequential_and_ordered() {
        let tracker = Recorder {
            fail: vec![],
            calls: Mutex::new(Vec::new()),
        };
        let outcome = tracker
            .batch_update("key", &updates(&[3, 1, 2]))
            .await
            .unwrap();

        assert_eq!(*tracker.calls.lock().unwrap(), vec![3, 1, 2]);
        assert_eq!(outcome.successful.len(), 3);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn test_batch_update_continues_past_failures() {
        let tracker = Recorder {
            fail: vec![2],
            calls: Mutex::new(Vec::new()),
        };
        let outcome = tracker
            .batch_update("key", &updates(&[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(*tracker.calls.lock().unwrap(), vec![1, 2, 3]);
        let ok: Vec<u64> = outcome.successful.iter().map(|id| id.get()).collect();
        assert_eq!(ok, vec![1, 3]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].id.get(), 2);
        assert_eq!(outcome.failed[0].error, "Not Found");
    }
}
