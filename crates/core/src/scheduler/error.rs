//! Scheduler error types

use thiserror::Error;
use virtstat_domain::VirtstatError;

/// Scheduler lifecycle errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// The loop did not exit within the join timeout
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The loop task panicked or was aborted
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for VirtstatError {
    fn from(err: SchedulerError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
