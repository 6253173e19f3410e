#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use momo_reconciler::application::reconciler::CallbackReconciler;
use momo_reconciler::domain::amount::Amount;
use momo_reconciler::domain::coverage::{CoverageRecord, CoverageUpdate};
use momo_reconciler::domain::ports::{CoverageStore, TransactionStore};
use momo_reconciler::domain::transaction::PendingTransaction;
use momo_reconciler::domain::transaction_id::{ClientTransactionId, TransactionKind};
use momo_reconciler::error::{ReconcileError, Result};
use momo_reconciler::infrastructure::clock::FixedClock;
use momo_reconciler::infrastructure::in_memory::{InMemoryCoverageStore, InMemoryTransactionStore};
use momo_reconciler::interfaces::http::{self, AppState};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const CNPS_ID: &str = "CNPS-20240115093000-K7Q2";
pub const CMU_ID: &str = "CMU-20240115093000-P4X9";
pub const MERCHANT: &str = "MRC-0042";

pub fn pending(id: &str) -> PendingTransaction {
    PendingTransaction::new(
        ClientTransactionId::parse(id).unwrap(),
        MERCHANT,
        Amount::new(dec!(5000)).unwrap(),
        Amount::new(dec!(75)).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
    )
}

pub fn callback(id: &str, status: &str) -> Value {
    json!({
        "idFromClient": id,
        "idFromGU": "GU-20240115-000123",
        "status": status,
        "message": "Paiement traite",
        "amount": 5000,
        "fees": 75
    })
}

/// Coverage store that counts the calls which actually changed a record.
#[derive(Default, Clone)]
pub struct CountingCoverageStore {
    inner: InMemoryCoverageStore,
    pub mutations: Arc<AtomicUsize>,
}

impl CountingCoverageStore {
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoverageStore for CountingCoverageStore {
    async fn record_outcome(&self, update: CoverageUpdate) -> Result<bool> {
        let changed = self.inner.record_outcome(update).await?;
        if changed {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(changed)
    }

    async fn get(&self, kind: TransactionKind, merchant_id: &str) -> Result<Option<CoverageRecord>> {
        self.inner.get(kind, merchant_id).await
    }

    async fn all(&self) -> Result<Vec<CoverageRecord>> {
        self.inner.all().await
    }
}

/// Coverage store whose first `failures` writes fail, as if storage dropped out
/// between the transaction update and the coverage update.
#[derive(Clone)]
pub struct FlakyCoverageStore {
    inner: InMemoryCoverageStore,
    remaining_failures: Arc<AtomicUsize>,
}

impl FlakyCoverageStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: InMemoryCoverageStore::new(),
            remaining_failures: Arc::new(AtomicUsize::new(failures)),
        }
    }
}

#[async_trait]
impl CoverageStore for FlakyCoverageStore {
    async fn record_outcome(&self, update: CoverageUpdate) -> Result<bool> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ReconcileError::InternalError(Box::new(std::io::Error::other(
                "coverage storage unavailable",
            ))));
        }
        self.inner.record_outcome(update).await
    }

    async fn get(&self, kind: TransactionKind, merchant_id: &str) -> Result<Option<CoverageRecord>> {
        self.inner.get(kind, merchant_id).await
    }

    async fn all(&self) -> Result<Vec<CoverageRecord>> {
        self.inner.all().await
    }
}

pub async fn reconciler_with<C>(seeded: &[&str], coverage: C) -> CallbackReconciler
where
    C: CoverageStore + 'static,
{
    let transactions = InMemoryTransactionStore::new();
    for id in seeded {
        transactions.insert(pending(id)).await.unwrap();
    }
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 9, 31, 0).unwrap());
    CallbackReconciler::new(Box::new(transactions), Box::new(coverage), Arc::new(clock))
}

pub async fn reconciler(
    seeded: &[&str],
) -> (CallbackReconciler, CountingCoverageStore) {
    let coverage = CountingCoverageStore::default();
    let reconciler = reconciler_with(seeded, coverage.clone()).await;
    (reconciler, coverage)
}

/// Serves the router on an ephemeral port and returns its base URL.
pub async fn spawn_server(reconciler: CallbackReconciler) -> String {
    let app = http::router(AppState {
        reconciler: Arc::new(reconciler),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
