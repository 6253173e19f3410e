use super::amount::Amount;
use super::transaction::TerminalStatus;
use super::transaction_id::{ClientTransactionId, TransactionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    #[default]
    Unpaid,
    Paid,
}

/// A merchant's social-protection coverage for one product.
///
/// Completed payments credit the record; each client transaction ID is
/// credited at most once.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CoverageRecord {
    pub kind: TransactionKind,
    pub merchant_id: String,
    pub status: CoverageStatus,
    pub total_paid: Amount,
    pub settled_transactions: Vec<ClientTransactionId>,
    pub last_failed_transaction: Option<ClientTransactionId>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A resolved payment to be reflected on the coverage record.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageUpdate {
    pub kind: TransactionKind,
    pub merchant_id: String,
    pub client_transaction_id: ClientTransactionId,
    pub status: TerminalStatus,
    pub amount: Amount,
    pub at: DateTime<Utc>,
}

impl CoverageRecord {
    pub fn new(kind: TransactionKind, merchant_id: impl Into<String>) -> Self {
        Self {
            kind,
            merchant_id: merchant_id.into(),
            status: CoverageStatus::Unpaid,
            total_paid: Amount::ZERO,
            settled_transactions: Vec::new(),
            last_failed_transaction: None,
            updated_at: None,
        }
    }

    /// Applies `update`, returning whether anything changed.
    pub fn apply(&mut self, update: &CoverageUpdate) -> bool {
        match update.status {
            TerminalStatus::Completed => {
                if self.settled_transactions.contains(&update.client_transaction_id) {
                    return false;
                }
                self.settled_transactions
                    .push(update.client_transaction_id.clone());
                self.total_paid += update.amount;
                self.status = CoverageStatus::Paid;
            }
            TerminalStatus::Failed => {
                if self.last_failed_transaction.as_ref() == Some(&update.client_transaction_id) {
                    return false;
                }
                self.last_failed_transaction = Some(update.client_transaction_id.clone());
            }
        }
        self.updated_at = Some(update.at);
        true
    }
}
