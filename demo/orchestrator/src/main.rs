// Demo Orchestrator - drives the full redistribution flow end to end:
// stock intake, FEFO allocation, pickup scheduling, impact reporting.

use allocation::{AllocationEngine, Config as AllocationConfig, Error as AllocationError};
use chrono::{Days, NaiveTime, Utc};
use colored::Colorize;
use dispatch::{spawn_dispatch_actor, Driver, DriverId, VehicleType};
use impact::ImpactAggregator;
use inventory_core::types::{Category, NgoId, NgoProfile, SourceId, SourceProfile};
use inventory_core::{Config as LedgerConfig, InventoryLedger};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("\n{}", "=================================================".green());
    println!("{}", "  Perishable Redistribution - End-to-End Demo".green().bold());
    println!("{}", "=================================================".green());

    let mut config = LedgerConfig::default();
    config.data_dir = std::env::temp_dir().join(format!("perishable-demo-{}", std::process::id()));
    tracing::info!(data_dir = ?config.data_dir, "Demo ledger location");
    let ledger = Arc::new(InventoryLedger::open(config)?);

    seed_directory(&ledger);

    let engine = AllocationEngine::new(ledger.clone(), AllocationConfig::default());
    let aggregator = ImpactAggregator::new(ledger.clone());

    let dispatch = spawn_dispatch_actor();
    dispatch.register_driver(Driver::new(DriverId(1), "Asha")).await?;
    dispatch.register_driver(Driver::new(DriverId(2), "Bert")).await?;

    // Stage 1: sources report surplus stock
    println!("\n{}", "[1/4] Sources report surplus stock".cyan().bold());
    let today = Utc::now().date_naive();
    let bread = Category::new("Bread");
    let produce = Category::new("Fresh Produce");

    for (source, category, quantity, days) in [
        (SourceId(1), bread.clone(), 8, 2u64),
        (SourceId(1), produce.clone(), 12, 1),
        (SourceId(2), bread.clone(), 6, 5),
    ] {
        let expiry = today.checked_add_days(Days::new(days)).unwrap();
        ledger.add_stock(source, category.clone(), quantity, expiry)?;
        println!("  + {} kg of {} from source {} (expires {})", quantity, category, source, expiry);
        sleep(Duration::from_millis(150)).await;
    }

    // Stage 2: NGOs request food
    println!("\n{}", "[2/4] NGOs request food".cyan().bold());

    let fulfilled = engine.allocate(NgoId(7), &bread, 10).await?;
    println!(
        "  {} 10 kg of Bread for Harbor Shelter from source {} ({} lots, donation {})",
        "FULFILLED".green(),
        fulfilled.source_id,
        fulfilled.slices.len(),
        fulfilled.donation_id
    );

    match engine.allocate(NgoId(9), &produce, 40).await {
        Err(AllocationError::NoSourceAvailable(reason)) => {
            println!("  {} {}", "NO SOURCE".red(), reason);
        }
        other => println!("  unexpected outcome: {:?}", other.map(|r| r.donation_id)),
    }
    sleep(Duration::from_millis(300)).await;

    // Stage 3: pickups for the confirmed donation
    println!("\n{}", "[3/4] Pickups scheduled".cyan().bold());
    let pickup_time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    let pickup = dispatch
        .schedule_pickup(fulfilled.source_id, "Harbor Shelter", VehicleType::Van, today, pickup_time)
        .await?;
    let assigned = dispatch.pickup(pickup).await?;
    println!("  Pickup {} assigned to driver {}", pickup, assigned.driver_id);

    dispatch.complete_pickup(pickup).await?;
    println!("  Pickup completed, driver {} released", assigned.driver_id);
    sleep(Duration::from_millis(300)).await;

    // Stage 4: feedback and impact reporting
    println!("\n{}", "[4/4] Impact reporting".cyan().bold());
    ledger.record_feedback(
        fulfilled.source_id,
        NgoId(7),
        "Harbor Shelter",
        "Delivered fresh and on time",
        5,
        150,
    )?;

    let summary = aggregator.source_impact(fulfilled.source_id);
    println!(
        "  Source {}: {} kg donated to {} NGO(s), {} people helped",
        fulfilled.source_id,
        summary.total_quantity,
        summary.distinct_ngo_count,
        summary.total_people_helped
    );

    for row in aggregator.top_demanded_categories(3)? {
        println!(
            "  Demand: {} requested {} {} time(s)",
            row.ngo_name, row.category, row.request_count
        );
    }

    let totals = aggregator.system_totals();
    println!("\n{}", "System totals".bold());
    println!("{}", serde_json::to_string_pretty(&totals)?);

    let fleet = dispatch.fleet_stats().await?;
    println!(
        "\nFleet: {}/{} drivers available, {} pickup(s) completed",
        fleet.available, fleet.total_drivers, fleet.completed_pickups_total
    );

    dispatch.shutdown().await?;
    println!("\n{}", "Demo complete.".green().bold());
    Ok(())
}

fn seed_directory(ledger: &InventoryLedger) {
    ledger.directory().upsert_source(SourceProfile {
        source_id: SourceId(1),
        name: "Greenfield Bakery".to_string(),
        locality: "Northside".to_string(),
    });
    ledger.directory().upsert_source(SourceProfile {
        source_id: SourceId(2),
        name: "Riverside Market".to_string(),
        locality: "Dockyards".to_string(),
    });
    ledger.directory().upsert_ngo(NgoProfile {
        ngo_id: NgoId(7),
        name: "Harbor Shelter".to_string(),
        category_pref: Some(Category::new("Bread")),
    });
    ledger.directory().upsert_ngo(NgoProfile {
        ngo_id: NgoId(9),
        name: "Eastside Kitchen".to_string(),
        category_pref: None,
    });
}
