//! Main ledger orchestration layer
//!
//! Ties together the lot table, the append-only donation/request/feedback
//! ledgers and storage into the API the allocation engine and the impact
//! aggregator build on.
//!
//! # Locking discipline
//!
//! Every lot has its own lock; an allocation only ever holds the locks of
//! the lots it touches, acquired in ascending lot-id order. Unrelated
//! categories never contend. The in-memory table is only updated after the
//! storage batch has landed, so a storage failure leaves both views
//! untouched.

use crate::{
    directory::Directory,
    metrics::Metrics,
    store::Store,
    types::{
        Category, DeliveryLink, DemandRequest, DonationRecord, FeedbackRecord, InventoryLot,
        LotId, LotTake, LotView, NgoId, SourceId,
    },
    Config, Error, Result,
};
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use uuid::Uuid;

/// Ground-truth ledger state
pub struct InventoryLedger {
    /// Storage backend
    store: Store,

    /// Lot table, one lock per lot
    lots: DashMap<LotId, Arc<Mutex<InventoryLot>>>,

    /// Append-only donation ledger
    donations: RwLock<Vec<DonationRecord>>,

    /// Delivery links, one per donation
    links: RwLock<Vec<DeliveryLink>>,

    /// Demand request log, met and unmet
    requests: RwLock<Vec<DemandRequest>>,

    /// Feedback ledger
    feedback: RwLock<Vec<FeedbackRecord>>,

    /// Source/NGO directory mirror
    directory: Directory,

    /// Prometheus metrics
    metrics: Metrics,
}

impl InventoryLedger {
    /// Open the ledger, rehydrating in-memory state from storage
    pub fn open(config: Config) -> Result<Self> {
        let store = Store::open(&config)?;

        let lots = DashMap::new();
        for lot in store.load_lots()? {
            lots.insert(lot.lot_id, Arc::new(Mutex::new(lot)));
        }

        let donations = RwLock::new(store.load_donations()?);
        let links = RwLock::new(store.load_links()?);
        let requests = RwLock::new(store.load_requests()?);
        let feedback = RwLock::new(store.load_feedback()?);

        let metrics = Metrics::new()
            .map_err(|e| Error::Other(format!("Failed to create metrics: {}", e)))?;
        metrics.set_lots_live(lots.len() as i64);

        tracing::info!(
            lots = lots.len(),
            donations = donations.read().len(),
            requests = requests.read().len(),
            "Inventory ledger opened"
        );

        Ok(Self {
            store,
            lots,
            donations,
            links,
            requests,
            feedback,
            directory: Directory::new(),
            metrics,
        })
    }

    // Stock operations

    /// Register new stock reported by a source
    pub fn add_stock(
        &self,
        source_id: SourceId,
        category: Category,
        quantity: u32,
        expiry: NaiveDate,
    ) -> Result<LotId> {
        if quantity == 0 {
            return Err(Error::InvalidRequest(
                "stock quantity must be positive".to_string(),
            ));
        }

        let lot = InventoryLot {
            lot_id: LotId::new(),
            source_id,
            category,
            quantity,
            expiry,
            received_at: Utc::now(),
        };

        self.store.put_lot(&lot)?;

        let lot_id = lot.lot_id;
        tracing::info!(
            %lot_id,
            %source_id,
            category = %lot.category,
            quantity,
            %expiry,
            "Stock added"
        );

        self.lots.insert(lot_id, Arc::new(Mutex::new(lot)));
        self.metrics.record_stock_added(quantity);
        self.metrics.set_lots_live(self.lots.len() as i64);

        Ok(lot_id)
    }

    /// Snapshot the lots currently available for matching.
    ///
    /// Excludes exhausted lots and lots whose expiry has passed as of the
    /// current date; expired data stays in the table until an explicit
    /// [`purge_expired`](Self::purge_expired) sweep. Ordered by expiry,
    /// then lot id, so callers see a stable sequence.
    pub fn available_lots(
        &self,
        source: Option<SourceId>,
        category: Option<&Category>,
    ) -> Vec<LotView> {
        let as_of = Utc::now().date_naive();

        let mut views = Vec::new();
        for entry in self.lots.iter() {
            let lot = entry.value().lock();
            if !lot.is_available(as_of) {
                continue;
            }
            if source.is_some_and(|source_id| lot.source_id != source_id) {
                continue;
            }
            if category.is_some_and(|category| &lot.category != category) {
                continue;
            }
            views.push(LotView {
                lot_id: lot.lot_id,
                source_id: lot.source_id,
                quantity: lot.quantity,
                expiry: lot.expiry,
            });
        }

        views.sort_by(|a, b| a.expiry.cmp(&b.expiry).then(a.lot_id.cmp(&b.lot_id)));
        views
    }

    /// Read a single lot
    pub fn lot(&self, lot_id: LotId) -> Option<InventoryLot> {
        self.lots.get(&lot_id).map(|entry| entry.value().lock().clone())
    }

    /// Decrement a single lot, serialized against every other mutation of
    /// that lot. Returns the new quantity.
    pub fn decrement(&self, lot_id: LotId, amount: u32) -> Result<u32> {
        let handle = self
            .lots
            .get(&lot_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::LotNotFound(lot_id.to_string()))?;

        let mut guard = handle.lock();
        if amount > guard.quantity {
            return Err(Error::InsufficientStock {
                lot_id: lot_id.to_string(),
                requested: amount,
                available: guard.quantity,
            });
        }

        let mut updated = guard.clone();
        updated.quantity -= amount;
        self.store.put_lot(&updated)?;

        let new_quantity = updated.quantity;
        *guard = updated;

        tracing::debug!(%lot_id, amount, new_quantity, "Lot decremented");
        Ok(new_quantity)
    }

    /// Commit an allocation plan atomically.
    ///
    /// Acquires the plan's lot locks in ascending lot-id order, re-validates
    /// quantity and expiry for every slice (the snapshot the plan was built
    /// from may be stale), then writes decremented lots, donation record,
    /// delivery link and fulfilled demand entry in one storage batch. On
    /// any [`Error::LotConflict`] or storage failure nothing is mutated.
    pub fn commit_allocation(
        &self,
        plan: &[LotTake],
        donation: DonationRecord,
        link: DeliveryLink,
        request: DemandRequest,
    ) -> Result<()> {
        if plan.is_empty() {
            return Err(Error::InvalidRequest("allocation plan is empty".to_string()));
        }

        let started = std::time::Instant::now();

        let mut ordered: Vec<&LotTake> = plan.iter().collect();
        ordered.sort_by_key(|take| take.lot_id);
        if ordered.windows(2).any(|pair| pair[0].lot_id == pair[1].lot_id) {
            return Err(Error::InvalidRequest(
                "allocation plan names the same lot twice".to_string(),
            ));
        }

        // Lock acquisition in id order keeps overlapping commits deadlock-free
        let mut handles = Vec::with_capacity(ordered.len());
        for take in &ordered {
            let handle = self
                .lots
                .get(&take.lot_id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| {
                    Error::LotConflict(format!("lot {} no longer exists", take.lot_id))
                })?;
            handles.push(handle);
        }
        let mut guards: Vec<_> = handles.iter().map(|handle| handle.lock()).collect();

        let as_of = Utc::now().date_naive();
        for (take, guard) in ordered.iter().zip(guards.iter()) {
            if guard.is_expired(as_of) {
                return Err(Error::LotConflict(format!("lot {} expired", take.lot_id)));
            }
            if guard.quantity < take.quantity {
                return Err(Error::LotConflict(format!(
                    "lot {} holds {} kg, plan needs {} kg",
                    take.lot_id, guard.quantity, take.quantity
                )));
            }
        }

        let updated: Vec<InventoryLot> = ordered
            .iter()
            .zip(guards.iter())
            .map(|(take, guard)| {
                let mut lot = (**guard).clone();
                lot.quantity -= take.quantity;
                lot
            })
            .collect();

        // Durable first; memory only moves once the batch has landed
        let donated_kg = donation.quantity;
        self.store
            .commit_allocation(&updated, &donation, &link, &request)?;

        for (guard, lot) in guards.iter_mut().zip(updated) {
            **guard = lot;
        }
        drop(guards);

        self.donations.write().push(donation);
        self.links.write().push(link);
        self.requests.write().push(request);

        self.metrics.record_demand_request();
        self.metrics.record_donation(donated_kg);
        self.metrics
            .record_commit_duration(started.elapsed().as_secs_f64());

        Ok(())
    }

    /// Remove lots whose expiry has passed. Administrative sweep; matching
    /// already excludes expired lots at read time.
    pub fn purge_expired(&self, as_of: NaiveDate) -> Result<Vec<LotId>> {
        let expired: Vec<LotId> = self
            .lots
            .iter()
            .filter_map(|entry| {
                let lot = entry.value().lock();
                lot.is_expired(as_of).then_some(lot.lot_id)
            })
            .collect();

        let mut purged = Vec::new();
        for lot_id in expired {
            let Some(handle) = self.lots.get(&lot_id).map(|entry| entry.value().clone())
            else {
                continue;
            };
            let guard = handle.lock();
            if !guard.is_expired(as_of) {
                continue;
            }
            self.store.delete_lot(lot_id)?;
            drop(guard);
            self.lots.remove(&lot_id);
            purged.push(lot_id);
        }

        if !purged.is_empty() {
            tracing::info!(count = purged.len(), %as_of, "Expired lots purged");
        }
        self.metrics.set_lots_live(self.lots.len() as i64);

        Ok(purged)
    }

    // Demand and feedback ledgers

    /// Append a demand request that did not result in a donation.
    /// Fulfilled requests are written by [`commit_allocation`](Self::commit_allocation).
    pub fn record_request(&self, request: DemandRequest) -> Result<()> {
        self.store.append_request(&request)?;
        self.requests.write().push(request);
        self.metrics.record_demand_request();
        Ok(())
    }

    /// Record NGO feedback on a completed delivery
    pub fn record_feedback(
        &self,
        source_id: SourceId,
        ngo_id: NgoId,
        destination: impl Into<String>,
        comment: impl Into<String>,
        rating: u8,
        people_helped: u32,
    ) -> Result<Uuid> {
        if !(1..=5).contains(&rating) {
            return Err(Error::InvalidRequest(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let record = FeedbackRecord {
            feedback_id: Uuid::now_v7(),
            source_id,
            ngo_id,
            destination: destination.into(),
            comment: comment.into(),
            rating,
            people_helped,
            recorded_at: Utc::now(),
        };

        self.store.append_feedback(&record)?;
        let feedback_id = record.feedback_id;
        self.feedback.write().push(record);

        Ok(feedback_id)
    }

    // Administrative corrections. These sit outside the allocation
    // protocol and do not restore inventory.

    /// Overwrite the quantity of a committed donation
    pub fn amend_donation(&self, donation_id: Uuid, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidRequest(
                "amended quantity must be positive; use retract_donation".to_string(),
            ));
        }

        let mut donations = self.donations.write();
        let donation = donations
            .iter_mut()
            .find(|d| d.donation_id == donation_id)
            .ok_or_else(|| Error::DonationNotFound(donation_id.to_string()))?;

        let mut updated = donation.clone();
        updated.quantity = quantity;
        self.store.append_donation(&updated)?;

        tracing::warn!(
            %donation_id,
            from = donation.quantity,
            to = quantity,
            "Donation amended (administrative correction)"
        );
        *donation = updated;

        Ok(())
    }

    /// Remove a committed donation and its delivery link
    pub fn retract_donation(&self, donation_id: Uuid) -> Result<()> {
        let mut donations = self.donations.write();
        let index = donations
            .iter()
            .position(|d| d.donation_id == donation_id)
            .ok_or_else(|| Error::DonationNotFound(donation_id.to_string()))?;

        self.store.delete_donation(donation_id)?;
        donations.remove(index);
        self.links.write().retain(|l| l.donation_id != donation_id);

        tracing::warn!(%donation_id, "Donation retracted (administrative correction)");
        Ok(())
    }

    // Snapshot accessors for the reporting path

    /// Donation ledger snapshot
    pub fn donations(&self) -> Vec<DonationRecord> {
        self.donations.read().clone()
    }

    /// Delivery link snapshot
    pub fn delivery_links(&self) -> Vec<DeliveryLink> {
        self.links.read().clone()
    }

    /// Demand request snapshot, in append order
    pub fn requests(&self) -> Vec<DemandRequest> {
        self.requests.read().clone()
    }

    /// Feedback ledger snapshot
    pub fn feedback(&self) -> Vec<FeedbackRecord> {
        self.feedback.read().clone()
    }

    /// Source/NGO directory
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of lots held, including exhausted ones
    pub fn lot_count(&self) -> usize {
        self.lots.len()
    }
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger")
            .field("lots", &self.lots.len())
            .finish_non_exhaustive()
    }
}
