//! Core types for the inventory and donation ledgers
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Unsigned quantities (negative stock is unrepresentable)
//! - Case-insensitive category matching

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Food source identifier (assigned by the upstream registry)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NGO identifier (assigned by the upstream registry)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NgoId(pub u64);

impl fmt::Display for NgoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lot identifier.
///
/// UUIDv7, so ascending lot id equals creation order. This is what makes
/// the matcher's expiry tie-break deterministic and reproducible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LotId(Uuid);

impl LotId {
    /// Mint a new time-ordered lot id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Raw bytes, used as the storage key
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for LotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Food category tag.
///
/// Keeps the label exactly as reported by the source, but compares,
/// hashes and orders by a lowercased key so that "Bread" and "bread"
/// are the same category everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    label: String,
    key: String,
}

impl Category {
    /// Create a category from a reported label
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let key = label.trim().to_lowercase();
        Self { label, key }
    }

    /// The label as originally reported
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The normalized matching key
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Category {}

impl std::hash::Hash for Category {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// One discrete quantity of a food category with one expiry date,
/// owned by one source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLot {
    /// Lot id (time-ordered)
    pub lot_id: LotId,

    /// Owning source
    pub source_id: SourceId,

    /// Food category
    pub category: Category,

    /// Remaining quantity in kilograms. Zero means logically exhausted.
    pub quantity: u32,

    /// Expiry date, evaluated at read time
    pub expiry: NaiveDate,

    /// When the source reported the stock
    pub received_at: DateTime<Utc>,
}

impl InventoryLot {
    /// A lot whose expiry has passed is treated as quantity 0 for matching
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expiry < as_of
    }

    /// Candidate for matching: positive quantity and not expired
    pub fn is_available(&self, as_of: NaiveDate) -> bool {
        self.quantity > 0 && !self.is_expired(as_of)
    }
}

/// Read-only snapshot of a lot handed to the matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotView {
    /// Lot id
    pub lot_id: LotId,
    /// Owning source
    pub source_id: SourceId,
    /// Quantity at snapshot time
    pub quantity: u32,
    /// Expiry date
    pub expiry: NaiveDate,
}

/// One slice of an allocation plan: take `quantity` kg from `lot_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotTake {
    /// Lot to decrement
    pub lot_id: LotId,
    /// Source owning the lot
    pub source_id: SourceId,
    /// Kilograms to take
    pub quantity: u32,
}

/// Committed allocation from a source to an NGO. Immutable once written;
/// administrative corrections go through explicit ledger operations that
/// are not part of the allocation protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRecord {
    /// Donation id
    pub donation_id: Uuid,

    /// Representative source (first lot consumed)
    pub source_id: SourceId,

    /// Receiving NGO
    pub ngo_id: NgoId,

    /// Category donated
    pub category: Category,

    /// Total kilograms consumed
    pub quantity: u32,

    /// Commit timestamp
    pub created_at: DateTime<Utc>,
}

/// Timestamped join between a donation and its fulfillment timeline;
/// one per donation, feeds trend aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryLink {
    /// Donation this link belongs to
    pub donation_id: Uuid,

    /// Date-time used for trend bucketing
    pub delivered_at: DateTime<Utc>,
}

/// How a demand request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestOutcome {
    /// Matched and committed; `source_id` is the representative source
    Fulfilled {
        /// Representative source of the committed donation
        source_id: SourceId,
    },
    /// No stock, or the commit could not be completed
    Unfulfilled,
}

/// One allocation attempt, recorded whether or not it succeeded.
/// Unmet requests are demand signal too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRequest {
    /// Request id
    pub request_id: Uuid,

    /// Requesting NGO
    pub ngo_id: NgoId,

    /// Requested category
    pub category: Category,

    /// Requested kilograms
    pub quantity: u32,

    /// When the request was made
    pub requested_at: DateTime<Utc>,

    /// Outcome of the attempt
    pub outcome: RequestOutcome,
}

impl DemandRequest {
    /// The source that fulfilled this request, if any
    pub fn fulfilled_by(&self) -> Option<SourceId> {
        match self.outcome {
            RequestOutcome::Fulfilled { source_id } => Some(source_id),
            RequestOutcome::Unfulfilled => None,
        }
    }
}

/// NGO feedback on a completed delivery, the input for people-helped
/// impact aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Feedback id
    pub feedback_id: Uuid,

    /// Source the delivery came from
    pub source_id: SourceId,

    /// NGO that received it
    pub ngo_id: NgoId,

    /// Where the food was distributed
    pub destination: String,

    /// Free-text feedback
    pub comment: String,

    /// Rating, 1 to 5
    pub rating: u8,

    /// People helped by this delivery
    pub people_helped: u32,

    /// When the feedback was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Source directory entry, pushed in from the upstream registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProfile {
    /// Source id
    pub source_id: SourceId,
    /// Display name
    pub name: String,
    /// Locality, reporting only
    pub locality: String,
}

/// NGO directory entry, pushed in from the upstream registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgoProfile {
    /// NGO id
    pub ngo_id: NgoId,
    /// Display name
    pub name: String,
    /// Declared category preference. Reporting hint only, never an
    /// allocation constraint.
    pub category_pref: Option<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_matching_is_case_insensitive() {
        assert_eq!(Category::new("Bread"), Category::new("bread"));
        assert_eq!(Category::new(" BREAD "), Category::new("bread"));
        assert_ne!(Category::new("Bread"), Category::new("Rice"));
    }

    #[test]
    fn test_category_preserves_label() {
        let cat = Category::new("Fresh Produce");
        assert_eq!(cat.label(), "Fresh Produce");
        assert_eq!(cat.key(), "fresh produce");
    }

    #[test]
    fn test_lot_availability() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let mut lot = InventoryLot {
            lot_id: LotId::new(),
            source_id: SourceId(1),
            category: Category::new("Bread"),
            quantity: 5,
            expiry: today,
            received_at: Utc::now(),
        };

        // Expiry on the current date is still available
        assert!(lot.is_available(today));

        // Past expiry excludes the lot even with positive quantity
        lot.expiry = today.pred_opt().unwrap();
        assert!(lot.is_expired(today));
        assert!(!lot.is_available(today));

        // Zero quantity excludes the lot even when fresh
        lot.expiry = today.succ_opt().unwrap();
        lot.quantity = 0;
        assert!(!lot.is_available(today));
    }

    #[test]
    fn test_lot_ids_order_by_creation() {
        let first = LotId::new();
        // v7 ids only order across millisecond boundaries
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = LotId::new();
        assert!(first < second);
    }

    #[test]
    fn test_request_outcome_source() {
        let request = DemandRequest {
            request_id: Uuid::now_v7(),
            ngo_id: NgoId(7),
            category: Category::new("Bread"),
            quantity: 5,
            requested_at: Utc::now(),
            outcome: RequestOutcome::Fulfilled {
                source_id: SourceId(3),
            },
        };
        assert_eq!(request.fulfilled_by(), Some(SourceId(3)));
    }
}
