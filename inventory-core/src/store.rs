//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `lots` - Current lot table (key: lot_id)
//! - `donations` - Append-only donation ledger (key: donation_id)
//! - `links` - Delivery links (key: donation_id)
//! - `requests` - Demand request log (key: request_id)
//! - `feedback` - Feedback ledger (key: feedback_id)
//!
//! An allocation commits its decremented lots, donation record, delivery
//! link and demand entry in one `WriteBatch`, so the ledger can never
//! observe inventory consumed without a matching donation or vice versa.

use crate::{
    error::{Error, Result},
    types::{DeliveryLink, DemandRequest, DonationRecord, FeedbackRecord, InventoryLot, LotId},
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_LOTS: &str = "lots";
const CF_DONATIONS: &str = "donations";
const CF_LINKS: &str = "links";
const CF_REQUESTS: &str = "requests";
const CF_FEEDBACK: &str = "feedback";

/// Storage wrapper for RocksDB
pub struct Store {
    db: Arc<DB>,
}

impl Store {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-heavy ledgers
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_LOTS, Self::cf_options_lots()),
            ColumnFamilyDescriptor::new(CF_DONATIONS, Self::cf_options_ledger()),
            ColumnFamilyDescriptor::new(CF_LINKS, Self::cf_options_ledger()),
            ColumnFamilyDescriptor::new(CF_REQUESTS, Self::cf_options_ledger()),
            ColumnFamilyDescriptor::new(CF_FEEDBACK, Self::cf_options_ledger()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_lots() -> Options {
        let mut opts = Options::default();
        // Lot table is read and rewritten constantly, favor speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_ledger() -> Options {
        let mut opts = Options::default();
        // Append-only archives, favor ratio
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Lot operations

    /// Put (insert or overwrite) a lot
    pub fn put_lot(&self, lot: &InventoryLot) -> Result<()> {
        let cf = self.cf_handle(CF_LOTS)?;
        let value = bincode::serialize(lot)?;
        self.db.put_cf(cf, lot.lot_id.as_bytes(), &value)?;

        tracing::debug!(
            lot_id = %lot.lot_id,
            quantity = lot.quantity,
            "Lot written"
        );

        Ok(())
    }

    /// Delete a lot (expiry sweep)
    pub fn delete_lot(&self, lot_id: LotId) -> Result<()> {
        let cf = self.cf_handle(CF_LOTS)?;
        self.db.delete_cf(cf, lot_id.as_bytes())?;
        Ok(())
    }

    /// Load the full lot table (used to rehydrate on open)
    pub fn load_lots(&self) -> Result<Vec<InventoryLot>> {
        self.load_all(CF_LOTS)
    }

    // Ledger appends

    /// Append a donation record
    pub fn append_donation(&self, donation: &DonationRecord) -> Result<()> {
        let cf = self.cf_handle(CF_DONATIONS)?;
        let value = bincode::serialize(donation)?;
        self.db.put_cf(cf, donation.donation_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Delete a donation record (administrative retraction only)
    pub fn delete_donation(&self, donation_id: Uuid) -> Result<()> {
        let cf_donations = self.cf_handle(CF_DONATIONS)?;
        let cf_links = self.cf_handle(CF_LINKS)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(cf_donations, donation_id.as_bytes());
        batch.delete_cf(cf_links, donation_id.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    /// Append a demand request
    pub fn append_request(&self, request: &DemandRequest) -> Result<()> {
        let cf = self.cf_handle(CF_REQUESTS)?;
        let value = bincode::serialize(request)?;
        self.db.put_cf(cf, request.request_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Append a feedback record
    pub fn append_feedback(&self, feedback: &FeedbackRecord) -> Result<()> {
        let cf = self.cf_handle(CF_FEEDBACK)?;
        let value = bincode::serialize(feedback)?;
        self.db.put_cf(cf, feedback.feedback_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Load ledgers (used to rehydrate on open)
    pub fn load_donations(&self) -> Result<Vec<DonationRecord>> {
        self.load_all(CF_DONATIONS)
    }

    /// Load all delivery links
    pub fn load_links(&self) -> Result<Vec<DeliveryLink>> {
        self.load_all(CF_LINKS)
    }

    /// Load all demand requests
    pub fn load_requests(&self) -> Result<Vec<DemandRequest>> {
        self.load_all(CF_REQUESTS)
    }

    /// Load all feedback records
    pub fn load_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        self.load_all(CF_FEEDBACK)
    }

    // Allocation commit (atomic)

    /// Commit one allocation: decremented lots, donation record, delivery
    /// link and fulfilled demand entry in a single atomic batch.
    pub fn commit_allocation(
        &self,
        lots: &[InventoryLot],
        donation: &DonationRecord,
        link: &DeliveryLink,
        request: &DemandRequest,
    ) -> Result<()> {
        let cf_lots = self.cf_handle(CF_LOTS)?;
        let cf_donations = self.cf_handle(CF_DONATIONS)?;
        let cf_links = self.cf_handle(CF_LINKS)?;
        let cf_requests = self.cf_handle(CF_REQUESTS)?;

        let mut batch = WriteBatch::default();

        for lot in lots {
            batch.put_cf(cf_lots, lot.lot_id.as_bytes(), bincode::serialize(lot)?);
        }
        batch.put_cf(
            cf_donations,
            donation.donation_id.as_bytes(),
            bincode::serialize(donation)?,
        );
        batch.put_cf(
            cf_links,
            link.donation_id.as_bytes(),
            bincode::serialize(link)?,
        );
        batch.put_cf(
            cf_requests,
            request.request_id.as_bytes(),
            bincode::serialize(request)?,
        );

        // Atomic commit
        self.db.write(batch)?;

        tracing::info!(
            donation_id = %donation.donation_id,
            source_id = %donation.source_id,
            ngo_id = %donation.ngo_id,
            quantity = donation.quantity,
            lots = lots.len(),
            "Allocation committed"
        );

        Ok(())
    }

    fn load_all<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self.db.iterator_cf(cf, IteratorMode::Start);

        let mut items = Vec::new();
        for item in iter {
            let (_, value) = item?;
            items.push(bincode::deserialize(&value)?);
        }

        Ok(items)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, NgoId, RequestOutcome, SourceId};
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Store::open(&config).unwrap(), temp_dir)
    }

    fn test_lot(quantity: u32) -> InventoryLot {
        InventoryLot {
            lot_id: LotId::new(),
            source_id: SourceId(1),
            category: Category::new("Bread"),
            quantity,
            expiry: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_put_and_load_lots() {
        let (store, _temp) = test_store();

        store.put_lot(&test_lot(5)).unwrap();
        store.put_lot(&test_lot(8)).unwrap();

        let lots = store.load_lots().unwrap();
        assert_eq!(lots.len(), 2);
        assert_eq!(lots.iter().map(|l| l.quantity).sum::<u32>(), 13);
    }

    #[test]
    fn test_put_overwrites_lot() {
        let (store, _temp) = test_store();

        let mut lot = test_lot(5);
        store.put_lot(&lot).unwrap();
        lot.quantity = 2;
        store.put_lot(&lot).unwrap();

        let lots = store.load_lots().unwrap();
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].quantity, 2);
    }

    #[test]
    fn test_delete_lot() {
        let (store, _temp) = test_store();

        let lot = test_lot(5);
        store.put_lot(&lot).unwrap();
        store.delete_lot(lot.lot_id).unwrap();

        assert!(store.load_lots().unwrap().is_empty());
    }

    #[test]
    fn test_commit_allocation_is_atomic_and_visible() {
        let (store, _temp) = test_store();

        let mut lot = test_lot(5);
        store.put_lot(&lot).unwrap();

        lot.quantity = 0;
        let donation = DonationRecord {
            donation_id: Uuid::now_v7(),
            source_id: SourceId(1),
            ngo_id: NgoId(7),
            category: Category::new("Bread"),
            quantity: 5,
            created_at: Utc::now(),
        };
        let link = DeliveryLink {
            donation_id: donation.donation_id,
            delivered_at: donation.created_at,
        };
        let request = DemandRequest {
            request_id: Uuid::now_v7(),
            ngo_id: NgoId(7),
            category: Category::new("Bread"),
            quantity: 5,
            requested_at: donation.created_at,
            outcome: RequestOutcome::Fulfilled {
                source_id: SourceId(1),
            },
        };

        store
            .commit_allocation(std::slice::from_ref(&lot), &donation, &link, &request)
            .unwrap();

        assert_eq!(store.load_lots().unwrap()[0].quantity, 0);
        assert_eq!(store.load_donations().unwrap().len(), 1);
        assert_eq!(store.load_links().unwrap().len(), 1);
        assert_eq!(store.load_requests().unwrap().len(), 1);
    }
}
