//! Aggregation over a live allocation flow
//!
//! Drives real allocations through the engine and checks that the
//! reporting derivations agree with what the ledgers committed.

use allocation::{AllocationEngine, Config as AllocationConfig};
use chrono::{Days, Utc};
use impact::ImpactAggregator;
use inventory_core::types::{Category, NgoId, NgoProfile, SourceId, SourceProfile};
use inventory_core::{Config as LedgerConfig, InventoryLedger};
use std::sync::Arc;
use tempfile::TempDir;

fn in_days(days: u64) -> chrono::NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .unwrap()
}

fn setup() -> (Arc<InventoryLedger>, AllocationEngine, ImpactAggregator, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = LedgerConfig::default();
    config.data_dir = temp_dir.path().to_path_buf();
    let ledger = Arc::new(InventoryLedger::open(config).unwrap());

    ledger.directory().upsert_source(SourceProfile {
        source_id: SourceId(1),
        name: "Greenfield Bakery".to_string(),
        locality: "Northside".to_string(),
    });
    ledger.directory().upsert_ngo(NgoProfile {
        ngo_id: NgoId(7),
        name: "Harbor Shelter".to_string(),
        category_pref: Some(Category::new("Bread")),
    });

    let engine = AllocationEngine::new(ledger.clone(), AllocationConfig::default());
    let aggregator = ImpactAggregator::new(ledger.clone());
    (ledger, engine, aggregator, temp_dir)
}

#[tokio::test]
async fn reporting_tracks_the_allocation_flow() {
    let (ledger, engine, aggregator, _temp) = setup();
    let bread = Category::new("Bread");
    let rice = Category::new("Rice");

    ledger.add_stock(SourceId(1), bread.clone(), 10, in_days(5)).unwrap();
    ledger.add_stock(SourceId(2), rice.clone(), 4, in_days(5)).unwrap();

    // Two fulfilled, one unmet (demand signal), one unmet rice
    engine.allocate(NgoId(7), &bread, 6).await.unwrap();
    engine.allocate(NgoId(7), &bread, 4).await.unwrap();
    assert!(engine.allocate(NgoId(7), &bread, 1).await.is_err());
    assert!(engine.allocate(NgoId(8), &rice, 9).await.is_err());

    ledger
        .record_feedback(SourceId(1), NgoId(7), "Harbor Shelter", "On time", 5, 120)
        .unwrap();

    // Per-source summary
    let summary = aggregator.source_impact(SourceId(1));
    assert_eq!(summary.total_quantity, 10);
    assert_eq!(summary.distinct_ngo_count, 1);
    assert_eq!(summary.total_people_helped, 120);

    // System totals agree with the summed per-source view
    let totals = aggregator.system_totals();
    assert_eq!(totals.total_quantity, 10);
    assert_eq!(totals.source_count, 1);
    assert_eq!(totals.ngo_count, 1);
    assert!((totals.avg_per_ngo - 10.0).abs() < f64::EPSILON);

    // Demand ranking counts the unmet requests and resolves names
    let top = aggregator.top_demanded_categories(5).unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].category, bread);
    assert_eq!(top[0].request_count, 3);
    assert_eq!(top[0].ngo_name, "Harbor Shelter");
    assert_eq!(top[0].source_id, Some(SourceId(1)));
    assert_eq!(top[0].source_name.as_deref(), Some("Greenfield Bakery"));
    // Rice never got fulfilled: no source on the row
    assert_eq!(top[1].request_count, 1);
    assert_eq!(top[1].source_id, None);
    assert_eq!(top[1].ngo_name, "ngo-8");

    // Truncation and validation
    assert_eq!(aggregator.top_demanded_categories(1).unwrap().len(), 1);
    assert!(aggregator.top_demanded_categories(0).is_err());

    // Both donations landed today
    let daily = aggregator.daily_totals();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].total_quantity, 10);

    let monthly = aggregator.source_monthly_trend(SourceId(1));
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].total_quantity, 10);
}

#[tokio::test]
async fn totals_are_consistent_across_sources() {
    let (ledger, engine, aggregator, _temp) = setup();
    let bread = Category::new("Bread");

    // Three sources; the middle one expires first so FEFO spreads the
    // donations across all of them
    ledger.add_stock(SourceId(1), bread.clone(), 5, in_days(9)).unwrap();
    ledger.add_stock(SourceId(2), bread.clone(), 5, in_days(2)).unwrap();
    ledger.add_stock(SourceId(3), bread.clone(), 5, in_days(30)).unwrap();

    engine.allocate(NgoId(7), &bread, 7).await.unwrap();
    engine.allocate(NgoId(8), &bread, 8).await.unwrap();

    let totals = aggregator.system_totals();
    let summed: u64 = [1, 2, 3]
        .into_iter()
        .map(|s| aggregator.source_impact(SourceId(s)).total_quantity)
        .sum();

    assert_eq!(totals.total_quantity, 15);
    assert_eq!(totals.total_quantity, summed);
    assert_eq!(totals.ngo_count, 2);
}
