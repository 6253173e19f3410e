use crate::domain::amount::Amount;
use crate::domain::ports::{Clock, TransactionStore};
use crate::domain::transaction::PendingTransaction;
use crate::domain::transaction_id::{ClientTransactionId, TransactionKind};
use crate::error::{ReconcileError, Result};
use crate::interfaces::csv::transaction_reader::PendingTransactionRecord;

const MAX_ID_ATTEMPTS: usize = 5;

/// A payment about to be sent to the gateway.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub kind: TransactionKind,
    pub merchant_id: String,
    pub amount: Amount,
    pub fees: Amount,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Generates a fresh client transaction ID and records the payment as pending.
///
/// The random suffix can collide within the same second; a collision is
/// retried with a new suffix.
pub async fn issue_transaction(
    store: &dyn TransactionStore,
    clock: &dyn Clock,
    request: IssueRequest,
) -> Result<PendingTransaction> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let now = clock.now();
        let id = ClientTransactionId::generate(request.kind, now, &mut rand::thread_rng());
        let tx = PendingTransaction::new(
            id,
            request.merchant_id.clone(),
            request.amount,
            request.fees,
            now,
        );

        match store.insert(tx.clone()).await {
            Ok(()) => {
                tracing::info!(
                    client_transaction_id = %tx.client_transaction_id,
                    merchant_id = %tx.merchant_id,
                    amount = %tx.amount,
                    "pending transaction issued"
                );
                return Ok(tx);
            }
            Err(ReconcileError::DuplicateTransaction(id)) => {
                tracing::debug!(%id, "transaction id collision, regenerating");
            }
            Err(e) => return Err(e),
        }
    }
    Err(ReconcileError::InternalError(Box::new(std::io::Error::other(
        "could not generate a unique transaction id",
    ))))
}

/// Loads pending transactions from decoded CSV records.
///
/// Unreadable rows and IDs that already exist are logged and skipped; storage
/// failures abort the import.
pub async fn import_transactions<I>(
    store: &dyn TransactionStore,
    clock: &dyn Clock,
    records: I,
) -> Result<ImportSummary>
where
    I: IntoIterator<Item = Result<PendingTransactionRecord>>,
{
    let mut summary = ImportSummary::default();
    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Error reading transaction");
                summary.skipped += 1;
                continue;
            }
        };

        match store.insert(record.into_pending(clock.now())).await {
            Ok(()) => summary.imported += 1,
            Err(ReconcileError::DuplicateTransaction(id)) => {
                tracing::warn!(%id, "transaction already exists, skipping");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}
