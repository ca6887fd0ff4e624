//! Metrics collection for observability
//!
//! Prometheus metrics for monitoring the allocation engine.
//!
//! # Metrics
//!
//! - `inventory_stock_added_kg_total` - Kilograms of stock reported
//! - `inventory_lots_live` - Lots currently held (including exhausted)
//! - `inventory_donations_total` - Committed donations
//! - `inventory_donated_kg_total` - Kilograms donated
//! - `inventory_demand_requests_total` - Allocation attempts, met or not
//! - `inventory_no_source_total` - Requests failed for lack of stock
//! - `inventory_conflict_retries_total` - Allocation commit conflicts
//! - `inventory_commit_duration_seconds` - Allocation commit latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Kilograms of stock reported by sources
    pub stock_added_kg: IntCounter,

    /// Lots currently held
    pub lots_live: IntGauge,

    /// Committed donations
    pub donations_total: IntCounter,

    /// Kilograms donated
    pub donated_kg: IntCounter,

    /// Allocation attempts, fulfilled or not
    pub demand_requests_total: IntCounter,

    /// Requests that failed for lack of stock
    pub no_source_total: IntCounter,

    /// Commit conflicts that triggered a retry
    pub conflict_retries_total: IntCounter,

    /// Allocation commit latencies
    pub commit_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let stock_added_kg = IntCounter::with_opts(Opts::new(
            "inventory_stock_added_kg_total",
            "Kilograms of stock reported by sources",
        ))?;
        registry.register(Box::new(stock_added_kg.clone()))?;

        let lots_live = IntGauge::with_opts(Opts::new(
            "inventory_lots_live",
            "Lots currently held, including exhausted lots",
        ))?;
        registry.register(Box::new(lots_live.clone()))?;

        let donations_total = IntCounter::with_opts(Opts::new(
            "inventory_donations_total",
            "Committed donations",
        ))?;
        registry.register(Box::new(donations_total.clone()))?;

        let donated_kg = IntCounter::with_opts(Opts::new(
            "inventory_donated_kg_total",
            "Kilograms donated",
        ))?;
        registry.register(Box::new(donated_kg.clone()))?;

        let demand_requests_total = IntCounter::with_opts(Opts::new(
            "inventory_demand_requests_total",
            "Allocation attempts, fulfilled or not",
        ))?;
        registry.register(Box::new(demand_requests_total.clone()))?;

        let no_source_total = IntCounter::with_opts(Opts::new(
            "inventory_no_source_total",
            "Requests that failed for lack of stock",
        ))?;
        registry.register(Box::new(no_source_total.clone()))?;

        let conflict_retries_total = IntCounter::with_opts(Opts::new(
            "inventory_conflict_retries_total",
            "Allocation commit conflicts that triggered a retry",
        ))?;
        registry.register(Box::new(conflict_retries_total.clone()))?;

        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "inventory_commit_duration_seconds",
                "Allocation commit latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        Ok(Self {
            stock_added_kg,
            lots_live,
            donations_total,
            donated_kg,
            demand_requests_total,
            no_source_total,
            conflict_retries_total,
            commit_duration,
            registry,
        })
    }

    /// Record stock reported by a source
    pub fn record_stock_added(&self, kg: u32) {
        self.stock_added_kg.inc_by(kg as u64);
    }

    /// Record a committed donation
    pub fn record_donation(&self, kg: u32) {
        self.donations_total.inc();
        self.donated_kg.inc_by(kg as u64);
    }

    /// Record a demand request (met or unmet)
    pub fn record_demand_request(&self) {
        self.demand_requests_total.inc();
    }

    /// Record a request that failed for lack of stock
    pub fn record_no_source(&self) {
        self.no_source_total.inc();
    }

    /// Record a commit conflict retry
    pub fn record_conflict_retry(&self) {
        self.conflict_retries_total.inc();
    }

    /// Record allocation commit latency
    pub fn record_commit_duration(&self, duration_seconds: f64) {
        self.commit_duration.observe(duration_seconds);
    }

    /// Update the live-lot gauge
    pub fn set_lots_live(&self, count: i64) {
        self.lots_live.set(count);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.donations_total.get(), 0);
        assert_eq!(metrics.lots_live.get(), 0);
    }

    #[test]
    fn test_record_donation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_donation(5);
        metrics.record_donation(3);
        assert_eq!(metrics.donations_total.get(), 2);
        assert_eq!(metrics.donated_kg.get(), 8);
    }

    #[test]
    fn test_record_no_source() {
        let metrics = Metrics::new().unwrap();
        metrics.record_no_source();
        assert_eq!(metrics.no_source_total.get(), 1);
    }
}
