use crate::domain::coverage::{CoverageRecord, CoverageUpdate};
use crate::domain::ports::{CoverageStore, TransactionStore, Transition};
use crate::domain::transaction::{PendingTransaction, Resolution};
use crate::domain::transaction_id::TransactionKind;
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for pending and resolved transactions.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for merchant coverage records.
pub const CF_COVERAGE: &str = "coverage";

/// A persistent store implementation using RocksDB.
///
/// Transactions and coverage records live in separate Column Families.
/// RocksDB has no compare-and-set, so every read-modify-write goes through
/// `write_lock`; plain reads do not take it.
///
/// `Clone` shares the underlying `Arc<DB>` and the lock.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating the
    /// "transactions" and "coverage" column families if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());
        let cf_coverage = ColumnFamilyDescriptor::new(CF_COVERAGE, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions, cf_coverage])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ReconcileError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            items.push(serde_json::from_slice(&value)?);
        }
        Ok(items)
    }
}

fn coverage_key(kind: TransactionKind, merchant_id: &str) -> Vec<u8> {
    format!("{kind}:{merchant_id}").into_bytes()
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn insert(&self, tx: PendingTransaction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = tx.client_transaction_id.as_str().as_bytes();
        if self.read::<PendingTransaction>(CF_TRANSACTIONS, key)?.is_some() {
            return Err(ReconcileError::DuplicateTransaction(
                tx.client_transaction_id.to_string(),
            ));
        }
        self.write(CF_TRANSACTIONS, key, &tx)
    }

    async fn get(&self, id: &str) -> Result<Option<PendingTransaction>> {
        self.read(CF_TRANSACTIONS, id.as_bytes())
    }

    async fn all(&self) -> Result<Vec<PendingTransaction>> {
        // Keys are the transaction IDs, so the scan is already ordered by ID.
        self.scan(CF_TRANSACTIONS)
    }

    async fn resolve_if_pending(&self, id: &str, resolution: &Resolution) -> Result<Transition> {
        let _guard = self.write_lock.lock().await;
        let Some(mut tx) = self.read::<PendingTransaction>(CF_TRANSACTIONS, id.as_bytes())? else {
            return Ok(Transition::NotFound);
        };
        if !tx.resolve(resolution) {
            return Ok(Transition::AlreadyResolved(tx));
        }
        self.write(CF_TRANSACTIONS, id.as_bytes(), &tx)?;
        Ok(Transition::Applied(tx))
    }
}

#[async_trait]
impl CoverageStore for RocksDBStore {
    async fn record_outcome(&self, update: CoverageUpdate) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = coverage_key(update.kind, &update.merchant_id);
        let mut record = self
            .read::<CoverageRecord>(CF_COVERAGE, &key)?
            .unwrap_or_else(|| CoverageRecord::new(update.kind, update.merchant_id.clone()));
        if !record.apply(&update) {
            return Ok(false);
        }
        self.write(CF_COVERAGE, &key, &record)?;
        Ok(true)
    }

    async fn get(&self, kind: TransactionKind, merchant_id: &str) -> Result<Option<CoverageRecord>> {
        self.read(CF_COVERAGE, &coverage_key(kind, merchant_id))
    }

    async fn all(&self) -> Result<Vec<CoverageRecord>> {
        self.scan(CF_COVERAGE)
    }
}
