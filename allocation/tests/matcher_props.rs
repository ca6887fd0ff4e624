//! Property-based tests for the FEFO matcher
//!
//! - A plan, when produced, sums exactly to the requested quantity
//! - No slice takes more than its lot held
//! - Plans are a FEFO prefix: every slice but the last drains its lot
//! - A plan exists iff the aggregate quantity covers the request

use allocation::matcher::{fefo_order, plan};
use chrono::{Days, NaiveDate};
use inventory_core::types::{LotId, LotView, SourceId};
use proptest::prelude::*;
use std::collections::HashMap;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()
}

/// Strategy for generating candidate lot sets
fn lots_strategy() -> impl Strategy<Value = Vec<LotView>> {
    prop::collection::vec((1u32..50, 0u64..60, 1u64..5), 0..12).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(quantity, expiry_offset, source)| LotView {
                lot_id: LotId::new(),
                source_id: SourceId(source),
                quantity,
                expiry: base_date().checked_add_days(Days::new(expiry_offset)).unwrap(),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_plan_sums_to_request(lots in lots_strategy(), requested in 1u32..200) {
        let candidates = fefo_order(lots);
        if let Some(takes) = plan(&candidates, requested) {
            let total: u32 = takes.iter().map(|t| t.quantity).sum();
            prop_assert_eq!(total, requested);
        }
    }

    #[test]
    fn prop_no_slice_exceeds_its_lot(lots in lots_strategy(), requested in 1u32..200) {
        let by_id: HashMap<LotId, u32> = lots.iter().map(|l| (l.lot_id, l.quantity)).collect();
        let candidates = fefo_order(lots);

        if let Some(takes) = plan(&candidates, requested) {
            for take in &takes {
                prop_assert!(take.quantity <= by_id[&take.lot_id]);
            }
        }
    }

    #[test]
    fn prop_plan_is_fefo_prefix(lots in lots_strategy(), requested in 1u32..200) {
        let candidates = fefo_order(lots);

        if let Some(takes) = plan(&candidates, requested) {
            // Slices follow candidate order and all but the last drain the lot
            let ids: Vec<LotId> = candidates.iter().map(|c| c.lot_id).collect();
            let take_ids: Vec<LotId> = takes.iter().map(|t| t.lot_id).collect();
            prop_assert_eq!(&take_ids[..], &ids[..takes.len()]);

            for (take, candidate) in takes.iter().zip(candidates.iter()).rev().skip(1) {
                prop_assert_eq!(take.quantity, candidate.quantity);
            }
        }
    }

    #[test]
    fn prop_plan_exists_iff_covered(lots in lots_strategy(), requested in 1u32..200) {
        let total: u32 = lots.iter().map(|l| l.quantity).sum();
        let candidates = fefo_order(lots);

        prop_assert_eq!(plan(&candidates, requested).is_some(), total >= requested);
    }
}
