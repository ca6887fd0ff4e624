//! Impact Aggregator
//!
//! Read-only reporting derivations over the donation, demand and feedback
//! ledgers: per-source impact summaries, cross-system totals, demand
//! rankings and donation trends. Every derivation is a pure function over
//! a ledger snapshot taken at call time — nothing here is persisted, and
//! nothing here mutates, so the reporting path can never disturb the
//! allocation path.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod aggregate;
pub mod error;
pub mod types;

// Re-exports
pub use aggregate::ImpactAggregator;
pub use error::{Error, Result};
pub use types::{CategoryDemand, DailyTotal, ImpactSummary, MonthlyTotal, SystemTotals};
