//! FEFO candidate ordering and greedy planning
//!
//! Pure functions over a lot snapshot; the engine owns the surrounding
//! transaction. First-Expire-First-Out: soonest expiry first, ties broken
//! by ascending lot id, so the same snapshot always yields the same plan.

use inventory_core::types::{LotTake, LotView};

/// Order candidates First-Expire-First-Out
pub fn fefo_order(mut candidates: Vec<LotView>) -> Vec<LotView> {
    candidates.sort_by(|a, b| a.expiry.cmp(&b.expiry).then(a.lot_id.cmp(&b.lot_id)));
    candidates
}

/// Greedily build a plan that satisfies `requested` kilograms.
///
/// Consumes candidates in the given order until the request is satisfied.
/// Returns `None` when the aggregate available quantity falls short —
/// fulfillment is all-or-nothing, a partial plan is never produced.
pub fn plan(candidates: &[LotView], requested: u32) -> Option<Vec<LotTake>> {
    let mut remaining = requested;
    let mut takes = Vec::new();

    for lot in candidates {
        if remaining == 0 {
            break;
        }
        if lot.quantity == 0 {
            continue;
        }
        let quantity = lot.quantity.min(remaining);
        takes.push(LotTake {
            lot_id: lot.lot_id,
            source_id: lot.source_id,
            quantity,
        });
        remaining -= quantity;
    }

    (remaining == 0).then_some(takes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use inventory_core::types::{LotId, SourceId};

    fn view(source: u64, quantity: u32, expiry: (i32, u32, u32)) -> LotView {
        LotView {
            lot_id: LotId::new(),
            source_id: SourceId(source),
            quantity,
            expiry: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
        }
    }

    #[test]
    fn test_fefo_orders_by_expiry_then_id() {
        let late = view(1, 5, (2027, 4, 1));
        let early = view(2, 5, (2027, 3, 1));
        let tied_a = view(3, 5, (2027, 4, 1));

        let ordered = fefo_order(vec![tied_a.clone(), late.clone(), early.clone()]);
        assert_eq!(ordered[0].lot_id, early.lot_id);
        // Equal expiry falls back to ascending lot id
        let (x, y) = (ordered[1].lot_id, ordered[2].lot_id);
        assert!(x < y);
        assert_eq!(
            [x, y],
            {
                let mut pair = [late.lot_id, tied_a.lot_id];
                pair.sort();
                pair
            }
        );
    }

    #[test]
    fn test_plan_consumes_earliest_expiry_only() {
        // January lot covers the whole request; February lot untouched
        let candidates = fefo_order(vec![view(1, 5, (2027, 2, 1)), view(2, 5, (2027, 1, 1))]);
        let takes = plan(&candidates, 5).unwrap();

        assert_eq!(takes.len(), 1);
        assert_eq!(takes[0].source_id, SourceId(2));
        assert_eq!(takes[0].quantity, 5);
    }

    #[test]
    fn test_plan_spans_lots() {
        // Bread example: A(3 kg, March) + B(4 kg, April), request 5
        let a = view(1, 3, (2027, 3, 1));
        let b = view(2, 4, (2027, 4, 1));
        let candidates = fefo_order(vec![b, a]);

        let takes = plan(&candidates, 5).unwrap();
        assert_eq!(takes.len(), 2);
        assert_eq!(takes[0].source_id, SourceId(1));
        assert_eq!(takes[0].quantity, 3);
        assert_eq!(takes[1].source_id, SourceId(2));
        assert_eq!(takes[1].quantity, 2);
    }

    #[test]
    fn test_plan_exact_fit_consumes_lot_fully() {
        let candidates = vec![view(1, 5, (2027, 1, 1))];
        let takes = plan(&candidates, 5).unwrap();
        assert_eq!(takes[0].quantity, 5);
    }

    #[test]
    fn test_plan_fails_on_shortfall() {
        let candidates = vec![view(1, 3, (2027, 1, 1)), view(2, 5, (2027, 2, 1))];
        assert!(plan(&candidates, 10).is_none());
    }

    #[test]
    fn test_plan_with_no_candidates() {
        assert!(plan(&[], 1).is_none());
    }
}
