//! Domain model: pending payments, coverage records, the callback wire shape
//! and the storage ports the application layer depends on.

pub mod amount;
pub mod callback;
pub mod coverage;
pub mod ports;
pub mod transaction;
pub mod transaction_id;
