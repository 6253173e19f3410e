//! Application layer: the callback reconciler and the pending-transaction
//! ledger operations used by the CLI.

pub mod ledger;
pub mod reconciler;
