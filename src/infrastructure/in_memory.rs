use crate::domain::coverage::{CoverageRecord, CoverageUpdate};
use crate::domain::ports::{CoverageStore, TransactionStore, Transition};
use crate::domain::transaction::{PendingTransaction, Resolution};
use crate::domain::transaction_id::TransactionKind;
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for pending transactions.
///
/// Uses `Arc<RwLock<HashMap<String, PendingTransaction>>>` so clones share the
/// same data. `resolve_if_pending` holds the write lock across the status
/// check and the update, which is what serializes duplicate callbacks.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, PendingTransaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: PendingTransaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        match transactions.entry(tx.client_transaction_id.to_string()) {
            Entry::Occupied(entry) => Err(ReconcileError::DuplicateTransaction(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(tx);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<PendingTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(id).cloned())
    }

    async fn all(&self) -> Result<Vec<PendingTransaction>> {
        let transactions = self.transactions.read().await;
        let mut all: Vec<_> = transactions.values().cloned().collect();
        all.sort_by(|a, b| a.client_transaction_id.cmp(&b.client_transaction_id));
        Ok(all)
    }

    async fn resolve_if_pending(&self, id: &str, resolution: &Resolution) -> Result<Transition> {
        let mut transactions = self.transactions.write().await;
        let Some(tx) = transactions.get_mut(id) else {
            return Ok(Transition::NotFound);
        };
        if tx.resolve(resolution) {
            Ok(Transition::Applied(tx.clone()))
        } else {
            Ok(Transition::AlreadyResolved(tx.clone()))
        }
    }
}

/// A thread-safe in-memory store for coverage records, keyed by product and merchant.
#[derive(Default, Clone)]
pub struct InMemoryCoverageStore {
    records: Arc<RwLock<HashMap<(TransactionKind, String), CoverageRecord>>>,
}

impl InMemoryCoverageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoverageStore for InMemoryCoverageStore {
    async fn record_outcome(&self, update: CoverageUpdate) -> Result<bool> {
        let mut records = self.records.write().await;
        let record = records
            .entry((update.kind, update.merchant_id.clone()))
            .or_insert_with(|| CoverageRecord::new(update.kind, update.merchant_id.clone()));
        Ok(record.apply(&update))
    }

    async fn get(&self, kind: TransactionKind, merchant_id: &str) -> Result<Option<CoverageRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(kind, merchant_id.to_string())).cloned())
    }

    async fn all(&self) -> Result<Vec<CoverageRecord>> {
        let records = self.records.read().await;
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| (a.kind, &a.merchant_id).cmp(&(b.kind, &b.merchant_id)));
        Ok(all)
    }
}
