//! Derived reporting types
//!
//! None of these are stored; they are recomputed from the ledgers on
//! every call so dashboards always see the latest committed state.

use chrono::NaiveDate;
use inventory_core::types::{Category, NgoId, SourceId};
use serde::{Deserialize, Serialize};

/// Per-source impact summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    /// Total kilograms the source has donated
    pub total_quantity: u64,

    /// Distinct NGOs served by the source
    pub distinct_ngo_count: usize,

    /// People helped, summed from feedback joined by (source, NGO) pair
    pub total_people_helped: u64,
}

/// Cross-system totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemTotals {
    /// Total kilograms donated across all sources
    pub total_quantity: u64,

    /// Distinct sources with at least one donation
    pub source_count: usize,

    /// Distinct NGOs with at least one donation received
    pub ngo_count: usize,

    /// `total_quantity / ngo_count`, 0 when no NGO has received anything
    pub avg_per_ngo: f64,
}

/// One row of the top-demanded-categories ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDemand {
    /// Most recent source that fulfilled this (NGO, category) demand;
    /// absent when no request in the group ever succeeded
    pub source_id: Option<SourceId>,

    /// Display name for `source_id`
    pub source_name: Option<String>,

    /// Requesting NGO
    pub ngo_id: NgoId,

    /// Display name for `ngo_id`
    pub ngo_name: String,

    /// Requested category
    pub category: Category,

    /// Allocation attempts, fulfilled or not
    pub request_count: usize,
}

/// Donated kilograms on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    /// Delivery date
    pub date: NaiveDate,
    /// Kilograms delivered that day
    pub total_quantity: u64,
}

/// Donated kilograms in one `%Y-%m` month bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// Month bucket, e.g. `2026-08`
    pub month: String,
    /// Kilograms delivered that month
    pub total_quantity: u64,
}
