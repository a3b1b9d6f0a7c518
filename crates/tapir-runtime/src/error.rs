//! Harness-level failures
//!
//! `TestFault`s are recorded per test and never stop the runner.
//! `RunError` is reserved for internal defects that abort the whole run.

use serde::Serialize;
use thiserror::Error;

/// A failure attributed to a single test that is not a plain assertion failure
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "fault", rename_all = "camelCase")]
pub enum TestFault {
    /// `end()` called on a test that had already completed
    #[error(".end() already called")]
    DoubleCompletion,

    /// Completion not reached within the configured bound
    #[error("test timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// An async body settled with an error
    #[error("test body rejected: {reason}")]
    UnhandledRejection { reason: String },

    /// The body panicked
    #[error("test body panicked: {message}")]
    Panicked { message: String },

    /// Every handle to the test was dropped before it completed
    #[error("test exited without ending")]
    ExitedWithoutEnd,

    /// Planned and recorded assertion counts differ
    #[error("plan != count: planned {planned}, recorded {actual}")]
    PlanMismatch { planned: usize, actual: usize },

    /// `plan()` called more than once
    #[error("plan already set to {planned}")]
    PlanRedeclared { planned: usize },

    /// An assertion was recorded after the test completed
    #[error("{operation} called after .end()")]
    AfterEnd { operation: String },
}

/// Unrecoverable runner failure
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
