//! Error types for the impact aggregator

use thiserror::Error;

/// Result type for aggregation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Aggregation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input (e.g. a non-positive result count)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
