//! Main allocation engine
//!
//! Orchestrates matching, commit retry and demand recording for one
//! request at a time. Concurrent requests are isolated by the ledger's
//! per-lot locks; this engine's job is the optimistic loop around them:
//! snapshot, plan, commit, and retry with backoff when the snapshot went
//! stale under its feet.

use crate::{
    config::Config,
    error::{Error, Result},
    matcher,
    recorder::DonationRecorder,
    types::AllocationResult,
};
use chrono::Utc;
use inventory_core::types::{Category, DemandRequest, NgoId, RequestOutcome};
use inventory_core::InventoryLedger;
use rand::Rng;
use std::sync::Arc;
use tokio::time::Duration;
use uuid::Uuid;

/// Allocation engine
pub struct AllocationEngine {
    /// Ground-truth ledger
    ledger: Arc<InventoryLedger>,

    /// Donation recorder
    recorder: DonationRecorder,

    /// Configuration
    config: Config,
}

impl AllocationEngine {
    /// Create new allocation engine
    pub fn new(ledger: Arc<InventoryLedger>, config: Config) -> Self {
        let recorder = DonationRecorder::new(ledger.clone());
        Self {
            ledger,
            recorder,
            config,
        }
    }

    /// The ledger this engine allocates from
    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        &self.ledger
    }

    /// Resolve a request to inventory and consume it.
    ///
    /// All-or-nothing: either the full requested quantity is committed as
    /// one donation, or nothing is touched. Exactly one demand entry is
    /// recorded per call, fulfilled or not.
    pub async fn allocate(
        &self,
        ngo_id: NgoId,
        category: &Category,
        quantity: u32,
    ) -> Result<AllocationResult> {
        if quantity == 0 {
            return Err(Error::InvalidRequest(
                "requested quantity must be positive".to_string(),
            ));
        }

        for attempt in 1..=self.config.max_attempts {
            let candidates =
                matcher::fefo_order(self.ledger.available_lots(None, Some(category)));

            let Some(plan) = matcher::plan(&candidates, quantity) else {
                let available: u64 = candidates.iter().map(|c| c.quantity as u64).sum();
                self.record_unfulfilled(ngo_id, category, quantity);
                self.ledger.metrics().record_no_source();

                tracing::info!(
                    %ngo_id,
                    %category,
                    requested = quantity,
                    available,
                    "No source available"
                );
                return Err(Error::NoSourceAvailable(format!(
                    "category '{}' has {} kg available, {} kg requested",
                    category, available, quantity
                )));
            };

            match self.recorder.record(ngo_id, category, &plan, Utc::now()) {
                Ok((donation_id, source_id)) => {
                    tracing::info!(
                        %donation_id,
                        %ngo_id,
                        %source_id,
                        %category,
                        quantity,
                        lots = plan.len(),
                        attempt,
                        "Allocation fulfilled"
                    );
                    return Ok(AllocationResult {
                        donation_id,
                        source_id,
                        quantity,
                        slices: plan,
                    });
                }
                Err(inventory_core::Error::LotConflict(reason)) => {
                    self.ledger.metrics().record_conflict_retry();
                    tracing::warn!(%ngo_id, %category, attempt, %reason, "Commit conflict");
                    self.backoff(attempt).await;
                }
                Err(inventory_core::Error::InvalidRequest(msg)) => {
                    return Err(Error::InvalidRequest(msg));
                }
                Err(err) => {
                    // Storage detail stays in the logs, not the caller's lap
                    tracing::error!(%ngo_id, %category, error = %err, "Ledger commit failed");
                    self.record_unfulfilled(ngo_id, category, quantity);
                    return Err(Error::Internal("ledger commit failed".to_string()));
                }
            }
        }

        self.record_unfulfilled(ngo_id, category, quantity);
        Err(Error::ConflictRetryExhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Demand signal includes unmet requests; best-effort, never masks
    /// the outcome the caller is about to receive.
    fn record_unfulfilled(&self, ngo_id: NgoId, category: &Category, quantity: u32) {
        let request = DemandRequest {
            request_id: Uuid::now_v7(),
            ngo_id,
            category: category.clone(),
            quantity,
            requested_at: Utc::now(),
            outcome: RequestOutcome::Unfulfilled,
        };
        if let Err(err) = self.ledger.record_request(request) {
            tracing::error!(%ngo_id, error = %err, "Failed to record demand request");
        }
    }

    async fn backoff(&self, attempt: u32) {
        let jitter = if self.config.retry_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.config.retry_jitter_ms)
        } else {
            0
        };
        let delay = self.config.retry_backoff_ms * attempt as u64 + jitter;
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

impl std::fmt::Debug for AllocationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
