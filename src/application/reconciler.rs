use crate::domain::callback::{CallbackPayload, GatewayStatus};
use crate::domain::coverage::CoverageUpdate;
use crate::domain::ports::{
    ClockRef, CoverageStore, CoverageStoreBox, TransactionStore, TransactionStoreBox, Transition,
};
use crate::domain::transaction::{PendingTransaction, Resolution, TerminalStatus, TransactionStatus};
use crate::domain::transaction_id::TransactionKind;
use crate::error::Result;

/// Returned to the gateway when the body is not a complete callback.
pub const MALFORMED_PAYLOAD_MESSAGE: &str = "Payload de callback invalide";
/// Returned to the gateway when `idFromClient` has no known product prefix.
pub const UNRECOGNIZED_TRANSACTION_MESSAGE: &str = "Type de transaction non reconnu";

/// Why a callback was refused. Both map to a client error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MalformedPayload,
    UnrecognizedTransaction,
}

impl Rejection {
    /// Gateway integrations match on "invalide" / "non reconnu" in these messages.
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MalformedPayload => MALFORMED_PAYLOAD_MESSAGE,
            Rejection::UnrecognizedTransaction => UNRECOGNIZED_TRANSACTION_MESSAGE,
        }
    }
}

/// What happened to local state for an acknowledged callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// A pending transaction was resolved and coverage updated.
    Applied,
    /// The transaction was already terminal; nothing changed.
    AlreadyResolved,
    /// No transaction with that ID exists; acknowledged anyway.
    UnknownTransaction,
    /// The gateway status does not end the transaction.
    NonTerminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Acknowledged {
        status: TransactionStatus,
        disposition: Disposition,
    },
    Rejected(Rejection),
}

impl CallbackOutcome {
    fn acknowledged(status: TransactionStatus, disposition: Disposition) -> Self {
        CallbackOutcome::Acknowledged { status, disposition }
    }
}

/// Reconciles gateway payment callbacks against pending CNPS/CMU payments.
///
/// Every well-formed callback in a known namespace is acknowledged, whether or
/// not it changes anything, so the gateway stops retrying. The pending →
/// terminal transition is delegated to [`TransactionStore::resolve_if_pending`],
/// so concurrent duplicates apply the coverage side effect once.
pub struct CallbackReconciler {
    transactions: TransactionStoreBox,
    coverage: CoverageStoreBox,
    clock: ClockRef,
}

impl CallbackReconciler {
    pub fn new(transactions: TransactionStoreBox, coverage: CoverageStoreBox, clock: ClockRef) -> Self {
        Self {
            transactions,
            coverage,
            clock,
        }
    }

    pub fn transactions(&self) -> &dyn TransactionStore {
        self.transactions.as_ref()
    }

    pub fn coverage(&self) -> &dyn CoverageStore {
        self.coverage.as_ref()
    }

    /// Handles a raw webhook body.
    ///
    /// `Err` is reserved for storage failures; every validation problem is an
    /// `Ok(CallbackOutcome::Rejected(_))`.
    pub async fn handle_callback(&self, body: &[u8]) -> Result<CallbackOutcome> {
        match CallbackPayload::from_slice(body) {
            Ok(payload) => self.reconcile(payload).await,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed callback");
                Ok(CallbackOutcome::Rejected(Rejection::MalformedPayload))
            }
        }
    }

    /// Handles an already decoded callback.
    pub async fn reconcile(&self, payload: CallbackPayload) -> Result<CallbackOutcome> {
        let id = payload.id_from_client.as_str();

        let Some(prefix_kind) = TransactionKind::from_id_prefix(id) else {
            tracing::warn!(id_from_client = id, "rejecting callback with unrecognized transaction prefix");
            return Ok(CallbackOutcome::Rejected(Rejection::UnrecognizedTransaction));
        };

        let Some(terminal) = GatewayStatus::parse(&payload.status).terminal() else {
            tracing::info!(
                id_from_client = id,
                gateway_status = %payload.status,
                "non-terminal callback acknowledged"
            );
            return Ok(CallbackOutcome::acknowledged(
                TransactionStatus::Pending,
                Disposition::NonTerminal,
            ));
        };
        let status = TransactionStatus::from(terminal);

        let resolution = Resolution {
            status: terminal,
            gateway_transaction_id: payload.id_from_gu.clone(),
            gateway_message: payload.message.clone(),
            resolved_at: self.clock.now(),
        };

        match self.transactions.resolve_if_pending(id, &resolution).await? {
            Transition::NotFound => {
                tracing::info!(id_from_client = id, %status, "callback for unknown transaction acknowledged");
                Ok(CallbackOutcome::acknowledged(status, Disposition::UnknownTransaction))
            }
            Transition::Applied(tx) => {
                if tx.kind != prefix_kind {
                    tracing::warn!(
                        id_from_client = id,
                        stored_kind = %tx.kind,
                        prefix_kind = %prefix_kind,
                        "transaction kind differs from id prefix, using stored kind"
                    );
                }
                if tx.amount != payload.amount {
                    tracing::warn!(
                        id_from_client = id,
                        expected = %tx.amount,
                        reported = %payload.amount,
                        "gateway reported a different amount"
                    );
                }
                self.propagate(&tx, terminal).await?;
                tracing::info!(
                    id_from_client = id,
                    id_from_gu = %payload.id_from_gu,
                    %status,
                    "transaction resolved"
                );
                Ok(CallbackOutcome::acknowledged(status, Disposition::Applied))
            }
            Transition::AlreadyResolved(tx) => {
                // Re-issue the stored outcome so a coverage update lost after the
                // transition committed lands on the gateway's retry. Concurrent
                // duplicates can also reach this before the applying call.
                if let Some(stored) = tx.status.terminal() {
                    if self.propagate(&tx, stored).await? {
                        tracing::debug!(
                            id_from_client = id,
                            stored_status = %tx.status,
                            "coverage updated from duplicate callback"
                        );
                    }
                }
                tracing::debug!(
                    id_from_client = id,
                    stored_status = %tx.status,
                    "duplicate callback for resolved transaction"
                );
                Ok(CallbackOutcome::acknowledged(status, Disposition::AlreadyResolved))
            }
        }
    }

    async fn propagate(&self, tx: &PendingTransaction, status: TerminalStatus) -> Result<bool> {
        let update = CoverageUpdate {
            kind: tx.kind,
            merchant_id: tx.merchant_id.clone(),
            client_transaction_id: tx.client_transaction_id.clone(),
            status,
            amount: tx.amount,
            at: tx.resolved_at.unwrap_or_else(|| self.clock.now()),
        };
        self.coverage.record_outcome(update).await
    }
}
