//! Error types for the inventory ledgers

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Lot does not exist
    #[error("Lot not found: {0}")]
    LotNotFound(String),

    /// Decrement larger than the lot's current quantity
    #[error("Insufficient stock in lot {lot_id}: requested {requested} kg, available {available} kg")]
    InsufficientStock {
        /// Lot that was short
        lot_id: String,
        /// Quantity the caller asked to take
        requested: u32,
        /// Quantity actually available
        available: u32,
    },

    /// A lot changed between the matching scan and the commit
    #[error("Lot state changed during allocation: {0}")]
    LotConflict(String),

    /// Donation record does not exist
    #[error("Donation not found: {0}")]
    DonationNotFound(String),

    /// Malformed caller input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
