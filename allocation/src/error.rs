//! Error types for the allocation engine
//!
//! Lot-level errors (`LotNotFound`, `InsufficientStock`, `LotConflict`)
//! and storage detail never escape this crate; they are translated into
//! the typed outcomes below at the matcher boundary.

use thiserror::Error;

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Allocation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input. Not retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Aggregate stock for the category is short of the request.
    /// Terminal for this request; nothing was committed.
    #[error("No source available: {0}")]
    NoSourceAvailable(String),

    /// Commit conflicts persisted through every retry. True availability
    /// is unknown; distinct from [`Error::NoSourceAvailable`].
    #[error("Allocation conflict not resolved after {attempts} attempts")]
    ConflictRetryExhausted {
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Ledger or storage failure. Detail is in the logs, not the message.
    #[error("Internal allocation error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
