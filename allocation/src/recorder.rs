//! Donation recording
//!
//! Builds the immutable paperwork for a matched plan — donation record,
//! delivery link, fulfilled demand entry — and submits it together with
//! the inventory decrements in one ledger transaction. A donation can
//! therefore never exist without its decrements, and vice versa.

use chrono::{DateTime, Utc};
use inventory_core::types::{
    Category, DeliveryLink, DemandRequest, DonationRecord, LotTake, NgoId, RequestOutcome,
    SourceId,
};
use inventory_core::InventoryLedger;
use std::sync::Arc;
use uuid::Uuid;

/// Commits matched plans as donations
#[derive(Debug, Clone)]
pub struct DonationRecorder {
    ledger: Arc<InventoryLedger>,
}

impl DonationRecorder {
    /// Create new recorder
    pub fn new(ledger: Arc<InventoryLedger>) -> Self {
        Self { ledger }
    }

    /// Commit a plan. Returns the donation id and the representative
    /// source (first lot consumed).
    ///
    /// Failure leaves the ledger exactly as it was: the commit is a single
    /// atomic transaction inside [`InventoryLedger::commit_allocation`].
    pub fn record(
        &self,
        ngo_id: NgoId,
        category: &Category,
        plan: &[LotTake],
        timestamp: DateTime<Utc>,
    ) -> inventory_core::Result<(Uuid, SourceId)> {
        let representative = plan.first().map(|take| take.source_id).ok_or_else(|| {
            inventory_core::Error::InvalidRequest("allocation plan is empty".to_string())
        })?;
        let quantity: u32 = plan.iter().map(|take| take.quantity).sum();

        let donation = DonationRecord {
            donation_id: Uuid::now_v7(),
            source_id: representative,
            ngo_id,
            category: category.clone(),
            quantity,
            created_at: timestamp,
        };
        let link = DeliveryLink {
            donation_id: donation.donation_id,
            delivered_at: timestamp,
        };
        let request = DemandRequest {
            request_id: Uuid::now_v7(),
            ngo_id,
            category: category.clone(),
            quantity,
            requested_at: timestamp,
            outcome: RequestOutcome::Fulfilled {
                source_id: representative,
            },
        };

        let donation_id = donation.donation_id;
        self.ledger.commit_allocation(plan, donation, link, request)?;

        Ok((donation_id, representative))
    }
}
