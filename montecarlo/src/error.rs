//! Error types for Monte Carlo estimation runs.

use thiserror::Error;

/// Boxed cause carried by [`Error::ExecutionFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while configuring, executing or reporting a run.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value was out of range (zero samples, tasks, workers or trials).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A unit of work failed; the whole run was aborted and partial results discarded.
    #[error("Execution failure: {context}")]
    ExecutionFailure {
        context: String,
        #[source]
        source: BoxError,
    },

    /// The run was cooperatively cancelled by its caller before completing.
    #[error("Cancelled after {completed} of {requested} samples")]
    Cancelled {
        completed: u64,
        requested: u64,
        /// Estimate computed from the samples drawn before cancellation, if any.
        partial_estimate: Option<f64>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Cause recorded when a worker panics while sampling.
#[derive(Error, Debug)]
#[error("worker panicked: {message}")]
pub struct WorkerPanic {
    pub message: String,
}

impl WorkerPanic {
    /// Extract a readable message from a payload returned by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// Wrap an underlying fault as an execution failure.
    pub fn execution<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::ExecutionFailure {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
