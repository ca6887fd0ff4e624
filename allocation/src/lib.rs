//! Allocation Matcher and Donation Recorder
//!
//! Resolves an (NGO, category, quantity) request to one or more inventory
//! lots and consumes them atomically: First-Expire-First-Out ordering,
//! all-or-nothing fulfillment, optimistic commit with bounded retry.
//!
//! # Control flow
//!
//! ```text
//! allocate(ngo, category, qty)
//!     │
//!     ▼
//! snapshot candidates ──► FEFO order ──► greedy plan
//!     │                                     │ insufficient aggregate
//!     │                                     ▼
//!     │                              NoSourceAvailable
//!     ▼
//! commit (per-lot locks, one storage batch)
//!     │ conflict: retry with backoff, bounded
//!     ▼
//! DonationRecord + DeliveryLink + DemandRequest
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod recorder;
pub mod types;

// Re-exports
pub use config::Config;
pub use engine::AllocationEngine;
pub use error::{Error, Result};
pub use recorder::DonationRecorder;
pub use types::AllocationResult;
