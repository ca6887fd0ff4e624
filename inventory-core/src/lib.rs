//! Perishable Inventory Core
//!
//! Ground-truth ledgers for the perishable redistribution platform:
//! per-source stock lots, the append-only donation ledger, the demand
//! request log, and the feedback ledger used for impact reporting.
//!
//! # Architecture
//!
//! - **Lot table**: per-lot locks scoped to the lots an allocation touches
//! - **Append-only ledgers**: donations and delivery links never mutate
//! - **Atomic commit**: one `WriteBatch` per allocation, all-or-nothing
//! - **Read-time expiry**: expired lots are excluded, never eagerly purged
//!
//! # Invariants
//!
//! - Stock conservation: Σ(decrements) never exceeds Σ(stock added)
//! - No donation without its inventory decrements, and vice versa
//! - Lot quantity never goes negative (unsigned by construction)

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use directory::Directory;
pub use error::{Error, Result};
pub use ledger::InventoryLedger;
pub use types::{
    Category, DeliveryLink, DemandRequest, DonationRecord, FeedbackRecord, InventoryLot, LotId,
    LotTake, LotView, NgoId, RequestOutcome, SourceId,
};
