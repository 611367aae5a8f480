//! # GPU Timing
//!
//! Timestamp slot management and submission tracking. The query pool
//! rents hardware timestamp slots to the tracker, which stitches the
//! written values back into per-submission capture events once the GPU
//! has caught up.

pub mod query_pool;
pub mod tracker;

pub use query_pool::{QuerySlots, TimerQueryPool};
pub use tracker::SubmissionTracker;

/// Timing subsystem error types
#[derive(Debug, Clone)]
pub enum TimingError {
    /// Driver refused to create the timestamp query pool
    QueryPoolCreationFailed(String),
}

impl std::fmt::Display for TimingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimingError::QueryPoolCreationFailed(msg) => {
                write!(f, "Query pool creation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for TimingError {}
