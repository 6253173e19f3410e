use super::coverage::{CoverageRecord, CoverageUpdate};
use super::transaction::{PendingTransaction, Resolution};
use super::transaction_id::TransactionKind;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Result of an attempt to resolve a pending transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The record was pending and now holds the resolution.
    Applied(PendingTransaction),
    /// The record was already terminal and was left untouched.
    AlreadyResolved(PendingTransaction),
    NotFound,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Stores a new transaction. Fails if the ID is already present.
    async fn insert(&self, tx: PendingTransaction) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<PendingTransaction>>;
    async fn all(&self) -> Result<Vec<PendingTransaction>>;
    /// Atomically applies `resolution` if and only if the record is still pending.
    async fn resolve_if_pending(&self, id: &str, resolution: &Resolution) -> Result<Transition>;
}

#[async_trait]
pub trait CoverageStore: Send + Sync {
    /// Reflects a resolved payment on the coverage record, creating it on first
    /// use. Returns whether the record changed.
    async fn record_outcome(&self, update: CoverageUpdate) -> Result<bool>;
    async fn get(&self, kind: TransactionKind, merchant_id: &str) -> Result<Option<CoverageRecord>>;
    async fn all(&self) -> Result<Vec<CoverageRecord>>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type CoverageStoreBox = Box<dyn CoverageStore>;
pub type ClockRef = Arc<dyn Clock>;
