//! Reporting derivations
//!
//! The aggregator snapshots the ledgers, hands the snapshots to pure
//! functions, and resolves display names through the directory. The pure
//! functions carry all the logic and are tested in isolation from the
//! mutation path.

use crate::{
    error::{Error, Result},
    types::{CategoryDemand, DailyTotal, ImpactSummary, MonthlyTotal, SystemTotals},
};
use chrono::Datelike;
use inventory_core::types::{
    Category, DeliveryLink, DemandRequest, DonationRecord, FeedbackRecord, NgoId, SourceId,
};
use inventory_core::InventoryLedger;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Read-only reporting facade over the ledgers
#[derive(Debug, Clone)]
pub struct ImpactAggregator {
    ledger: Arc<InventoryLedger>,
}

impl ImpactAggregator {
    /// Create new aggregator
    pub fn new(ledger: Arc<InventoryLedger>) -> Self {
        Self { ledger }
    }

    /// Impact summary for one source
    pub fn source_impact(&self, source_id: SourceId) -> ImpactSummary {
        let donations = self.ledger.donations();
        let feedback = self.ledger.feedback();
        tracing::debug!(%source_id, donations = donations.len(), "Computing source impact");

        summarize_source(source_id, &donations, &feedback)
    }

    /// Cross-system totals
    pub fn system_totals(&self) -> SystemTotals {
        summarize_system(&self.ledger.donations())
    }

    /// Most demanded categories, ranked by request count (unmet requests
    /// included — demand signal is demand, not supply). Ties break by
    /// ascending category, then NGO id, for a stable report.
    pub fn top_demanded_categories(&self, n: usize) -> Result<Vec<CategoryDemand>> {
        if n == 0 {
            return Err(Error::InvalidRequest(
                "result count must be positive".to_string(),
            ));
        }

        let requests = self.ledger.requests();
        let directory = self.ledger.directory();

        let mut rows: Vec<CategoryDemand> = rank_demand(&requests)
            .into_iter()
            .map(|group| CategoryDemand {
                source_name: group.fulfilled_by.map(|id| directory.source_name(id)),
                source_id: group.fulfilled_by,
                ngo_name: directory.ngo_name(group.ngo_id),
                ngo_id: group.ngo_id,
                category: group.category,
                request_count: group.request_count,
            })
            .collect();
        rows.truncate(n);

        Ok(rows)
    }

    /// Kilograms delivered per calendar day, across all sources
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        daily_totals(&self.ledger.donations(), &self.ledger.delivery_links())
    }

    /// Kilograms delivered per month for one source
    pub fn source_monthly_trend(&self, source_id: SourceId) -> Vec<MonthlyTotal> {
        monthly_trend(
            source_id,
            &self.ledger.donations(),
            &self.ledger.delivery_links(),
        )
    }
}

/// One (NGO, category) demand group
#[derive(Debug, Clone)]
pub struct DemandGroup {
    /// Requesting NGO
    pub ngo_id: NgoId,
    /// Requested category
    pub category: Category,
    /// Requests in the group, met or not
    pub request_count: usize,
    /// Most recent fulfilling source, if any request succeeded
    pub fulfilled_by: Option<SourceId>,
}

/// Sum donations and feedback into a per-source summary
pub fn summarize_source(
    source_id: SourceId,
    donations: &[DonationRecord],
    feedback: &[FeedbackRecord],
) -> ImpactSummary {
    let mut total_quantity = 0u64;
    let mut served: HashSet<NgoId> = HashSet::new();

    for donation in donations.iter().filter(|d| d.source_id == source_id) {
        total_quantity += donation.quantity as u64;
        served.insert(donation.ngo_id);
    }

    // Feedback joins on the (source, NGO) pairs this source has served
    let total_people_helped = feedback
        .iter()
        .filter(|f| f.source_id == source_id && served.contains(&f.ngo_id))
        .map(|f| f.people_helped as u64)
        .sum();

    ImpactSummary {
        total_quantity,
        distinct_ngo_count: served.len(),
        total_people_helped,
    }
}

/// Sum all donations into system-wide totals
pub fn summarize_system(donations: &[DonationRecord]) -> SystemTotals {
    let mut total_quantity = 0u64;
    let mut sources: HashSet<SourceId> = HashSet::new();
    let mut ngos: HashSet<NgoId> = HashSet::new();

    for donation in donations {
        total_quantity += donation.quantity as u64;
        sources.insert(donation.source_id);
        ngos.insert(donation.ngo_id);
    }

    let avg_per_ngo = if ngos.is_empty() {
        0.0
    } else {
        total_quantity as f64 / ngos.len() as f64
    };

    SystemTotals {
        total_quantity,
        source_count: sources.len(),
        ngo_count: ngos.len(),
        avg_per_ngo,
    }
}

/// Group the demand log by (NGO, category) and rank by request count,
/// ties by ascending category then NGO id
pub fn rank_demand(requests: &[DemandRequest]) -> Vec<DemandGroup> {
    let mut groups: HashMap<(NgoId, Category), DemandGroup> = HashMap::new();

    for request in requests {
        let group = groups
            .entry((request.ngo_id, request.category.clone()))
            .or_insert_with(|| DemandGroup {
                ngo_id: request.ngo_id,
                category: request.category.clone(),
                request_count: 0,
                fulfilled_by: None,
            });
        group.request_count += 1;
        // Requests arrive in append order, so the last hit is the most recent
        if let Some(source_id) = request.fulfilled_by() {
            group.fulfilled_by = Some(source_id);
        }
    }

    let mut ranked: Vec<DemandGroup> = groups.into_values().collect();
    ranked.sort_by(|a, b| {
        b.request_count
            .cmp(&a.request_count)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.ngo_id.cmp(&b.ngo_id))
    });
    ranked
}

/// Bucket delivered quantities by calendar day
pub fn daily_totals(donations: &[DonationRecord], links: &[DeliveryLink]) -> Vec<DailyTotal> {
    let by_id: HashMap<_, _> = donations.iter().map(|d| (d.donation_id, d)).collect();

    let mut buckets: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
    for link in links {
        if let Some(donation) = by_id.get(&link.donation_id) {
            *buckets.entry(link.delivered_at.date_naive()).or_default() +=
                donation.quantity as u64;
        }
    }

    buckets
        .into_iter()
        .map(|(date, total_quantity)| DailyTotal {
            date,
            total_quantity,
        })
        .collect()
}

/// Bucket one source's delivered quantities by `%Y-%m` month
pub fn monthly_trend(
    source_id: SourceId,
    donations: &[DonationRecord],
    links: &[DeliveryLink],
) -> Vec<MonthlyTotal> {
    let by_id: HashMap<_, _> = donations
        .iter()
        .filter(|d| d.source_id == source_id)
        .map(|d| (d.donation_id, d))
        .collect();

    let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
    for link in links {
        if let Some(donation) = by_id.get(&link.donation_id) {
            let stamp = link.delivered_at;
            let month = format!("{:04}-{:02}", stamp.year(), stamp.month());
            *buckets.entry(month).or_default() += donation.quantity as u64;
        }
    }

    buckets
        .into_iter()
        .map(|(month, total_quantity)| MonthlyTotal {
            month,
            total_quantity,
        })
        .collect()
}
