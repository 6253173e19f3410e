use super::amount::Amount;
use super::transaction_id::{ClientTransactionId, TransactionKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn terminal(&self) -> Option<TerminalStatus> {
        match self {
            TransactionStatus::Pending => None,
            TransactionStatus::Completed => Some(TerminalStatus::Completed),
            TransactionStatus::Failed => Some(TerminalStatus::Failed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal outcome reported by the gateway.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TerminalStatus {
    Completed,
    Failed,
}

impl From<TerminalStatus> for TransactionStatus {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Completed => TransactionStatus::Completed,
            TerminalStatus::Failed => TransactionStatus::Failed,
        }
    }
}

/// What the gateway told us when it resolved a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: TerminalStatus,
    pub gateway_transaction_id: String,
    pub gateway_message: String,
    pub resolved_at: DateTime<Utc>,
}

/// One payment request issued to the gateway and awaiting its callback.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PendingTransaction {
    pub client_transaction_id: ClientTransactionId,
    pub gateway_transaction_id: Option<String>,
    pub merchant_id: String,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub fees: Amount,
    pub status: TransactionStatus,
    pub gateway_message: Option<String>,
    pub received_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PendingTransaction {
    /// Creates a new pending transaction. The kind is taken from the ID prefix.
    pub fn new(
        client_transaction_id: ClientTransactionId,
        merchant_id: impl Into<String>,
        amount: Amount,
        fees: Amount,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: client_transaction_id.kind(),
            client_transaction_id,
            gateway_transaction_id: None,
            merchant_id: merchant_id.into(),
            amount,
            fees,
            status: TransactionStatus::Pending,
            gateway_message: None,
            received_at,
            resolved_at: None,
        }
    }

    /// Applies a terminal resolution. Returns `false` and leaves the record
    /// untouched if it is already terminal.
    pub fn resolve(&mut self, resolution: &Resolution) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = resolution.status.into();
        self.gateway_transaction_id = Some(resolution.gateway_transaction_id.clone());
        self.gateway_message = Some(resolution.gateway_message.clone());
        self.resolved_at = Some(resolution.resolved_at);
        true
    }
}
