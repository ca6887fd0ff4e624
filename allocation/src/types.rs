//! Core types for the allocation engine

use inventory_core::types::{LotTake, SourceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a successful allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Committed donation id
    pub donation_id: Uuid,

    /// Representative source: the source of the first lot consumed.
    /// Downstream callers expect one source id per request.
    pub source_id: SourceId,

    /// Total kilograms consumed (equals the requested quantity)
    pub quantity: u32,

    /// The lots consumed, in FEFO order
    pub slices: Vec<LotTake>,
}

impl AllocationResult {
    /// Distinct sources the allocation drew from
    pub fn source_count(&self) -> usize {
        let mut sources: Vec<SourceId> = self.slices.iter().map(|s| s.source_id).collect();
        sources.sort();
        sources.dedup();
        sources.len()
    }
}
