//! Unified error types for targetsync core.

use thiserror::Error;

/// Errors returned by a destination implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DestinationError {
    /// The destination could not be reached.
    #[error("Destination unavailable: {0}")]
    Unavailable(String),

    /// The destination refused the change.
    #[error("Destination rejected request: {0}")]
    Rejected(String),
}

pub type DestinationResult<T> = Result<T, DestinationError>;

/// Errors from the Consul HTTP API.
#[derive(Error, Debug)]
pub enum ConsulError {
    /// The configured agent address is not a usable base URL.
    #[error("Invalid Consul address: {0}")]
    InvalidAddress(String),

    /// HTTP request failed.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Consul answered with a non-success status.
    #[error("Consul returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Consul answered with something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<url::ParseError> for ConsulError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidAddress(e.to_string())
    }
}

/// Main error type for the sync engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    /// Reading or mutating the destination failed.
    #[error("Destination error: {0}")]
    Destination(#[from] DestinationError),

    /// Subscribing to the source failed.
    #[error("Source error: {0}")]
    Source(String),

    /// The source stream ended while its scope was still live.
    #[error("Source stream ended unexpectedly")]
    SourceClosed,

    /// Creating the lock failed.
    #[error("Locker error: {0}")]
    Locker(String),

    /// The leadership stream ended while the syncer was running.
    #[error("Lock channel closed")]
    LockerClosed,

    /// The removal scheduler of the current term is gone.
    #[error("Removal scheduler stopped")]
    SchedulerClosed,

    /// A leader term stopped on its own and the policy is to abort.
    #[error("Leader term failed: {0}")]
    TermFailed(#[source] Box<SyncError>),

    /// A term task panicked.
    #[error("Leader term task panicked: {0}")]
    TermPanicked(String),
}

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
