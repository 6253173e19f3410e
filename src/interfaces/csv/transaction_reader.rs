use crate::domain::amount::Amount;
use crate::domain::transaction::PendingTransaction;
use crate::domain::transaction_id::ClientTransactionId;
use crate::error::{ReconcileError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io::Read;

/// One row of a pending-transaction import file.
///
/// Columns: `client_transaction_id, merchant_id, amount, fees`. An empty
/// `fees` column means no fees.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PendingTransactionRecord {
    pub client_transaction_id: ClientTransactionId,
    pub merchant_id: String,
    pub amount: Amount,
    pub fees: Option<Amount>,
}

impl PendingTransactionRecord {
    pub fn into_pending(self, received_at: DateTime<Utc>) -> PendingTransaction {
        PendingTransaction::new(
            self.client_transaction_id,
            self.merchant_id,
            self.amount,
            self.fees.unwrap_or(Amount::ZERO),
            received_at,
        )
    }
}

/// Reads pending transactions from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<PendingTransactionRecord>` per row,
/// trimming whitespace and tolerating ragged rows.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily decodes rows so large files are never loaded whole.
    pub fn records(self) -> impl Iterator<Item = Result<PendingTransactionRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ReconcileError::from))
    }
}
