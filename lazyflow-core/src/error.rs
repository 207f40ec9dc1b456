//! Error types for stream evaluation.
//!
//! Two failure modes are caller obligations and have no variant here:
//!
//! - **Non-termination**: a terminal operation on an unbounded `generate`/`iterate`
//!   source with no upstream `limit` never returns.
//! - **Associativity violations**: a custom collector or `reduce_with` combiner that is
//!   not associative (or not consistent with its accumulator) gives different results
//!   in sequential and parallel mode.

use std::any::Any;

use thiserror::Error;

/// Stream error type
#[derive(Debug, Error)]
pub enum StreamError {
    /// An operation was invoked on a handle that was already linked or consumed.
    #[error("stream has already been operated upon or consumed")]
    Reused,

    /// A panic inside a parallel worker aborted the evaluation.
    #[error("worker fault in partition {partition}: {message}")]
    WorkerFault { partition: usize, message: String },

    /// The worker pool shut down before every partition reported.
    #[error("worker pool disconnected with {missing} partition(s) unreported")]
    Disconnected { missing: usize },

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl StreamError {
    /// Build a [`StreamError::WorkerFault`] from a caught panic payload.
    pub fn worker_fault(partition: usize, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        StreamError::WorkerFault { partition, message }
    }
}

/// Result type for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;
