mod common;

use common::{CNPS_ID, MERCHANT, pending};
use momo_reconciler::domain::amount::Amount;
use momo_reconciler::domain::coverage::CoverageUpdate;
use momo_reconciler::domain::ports::{
    CoverageStore, CoverageStoreBox, TransactionStore, TransactionStoreBox,
};
use momo_reconciler::domain::transaction::TerminalStatus;
use momo_reconciler::domain::transaction_id::{ClientTransactionId, TransactionKind};
use momo_reconciler::infrastructure::in_memory::{InMemoryCoverageStore, InMemoryTransactionStore};

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let transaction_store: TransactionStoreBox = Box::new(InMemoryTransactionStore::new());
    let coverage_store: CoverageStoreBox = Box::new(InMemoryCoverageStore::new());

    // Verify Send + Sync by spawning tasks
    let ts_handle = tokio::spawn(async move {
        transaction_store.insert(pending(CNPS_ID)).await.unwrap();
        transaction_store.get(CNPS_ID).await.unwrap().unwrap()
    });

    let cs_handle = tokio::spawn(async move {
        let update = CoverageUpdate {
            kind: TransactionKind::Cnps,
            merchant_id: MERCHANT.to_string(),
            client_transaction_id: ClientTransactionId::parse(CNPS_ID).unwrap(),
            status: TerminalStatus::Completed,
            amount: "5000".parse::<Amount>().unwrap(),
            at: chrono::Utc::now(),
        };
        coverage_store.record_outcome(update).await.unwrap();
        coverage_store
            .get(TransactionKind::Cnps, MERCHANT)
            .await
            .unwrap()
            .unwrap()
    });

    let retrieved_tx = ts_handle.await.unwrap();
    assert_eq!(retrieved_tx.client_transaction_id.as_str(), CNPS_ID);

    let record = cs_handle.await.unwrap();
    assert_eq!(record.merchant_id, MERCHANT);
}
