//! Error types for the pickup scheduler

use thiserror::Error;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Dispatch errors
#[derive(Error, Debug)]
pub enum Error {
    /// No driver in `Available` status. Terminal for this request.
    #[error("No driver available: {0}")]
    NoDriverAvailable(String),

    /// Driver does not exist
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Pickup does not exist
    #[error("Pickup not found: {0}")]
    PickupNotFound(String),

    /// Transition not allowed from the pickup's current status
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),
}
