use crate::domain::transaction::PendingTransaction;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LedgerRow<'a> {
    client_transaction_id: &'a str,
    kind: &'a str,
    merchant_id: &'a str,
    amount: String,
    fees: String,
    status: &'a str,
    gateway_transaction_id: &'a str,
    received_at: String,
    resolved_at: String,
}

/// Writes the transaction ledger as CSV.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_transactions(&mut self, transactions: &[PendingTransaction]) -> Result<()> {
        if transactions.is_empty() {
            // serde-driven headers are only emitted with the first row
            self.writer.write_record([
                "client_transaction_id",
                "kind",
                "merchant_id",
                "amount",
                "fees",
                "status",
                "gateway_transaction_id",
                "received_at",
                "resolved_at",
            ])?;
        }
        for tx in transactions {
            self.writer.serialize(LedgerRow {
                client_transaction_id: tx.client_transaction_id.as_str(),
                kind: tx.kind.as_str(),
                merchant_id: &tx.merchant_id,
                amount: tx.amount.to_string(),
                fees: tx.fees.to_string(),
                status: tx.status.as_str(),
                gateway_transaction_id: tx.gateway_transaction_id.as_deref().unwrap_or_default(),
                received_at: tx.received_at.to_rfc3339(),
                resolved_at: tx.resolved_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
