//! Transactions as seen by the interceptor.
//!
//! The interceptor does not run transactions itself. It drives a
//! [`TransactionManager`] and keeps the resulting [`TransactionStatus`]
//! visible to nested code through the thread's ambient slot.

mod ambient;
mod manager;
mod status;

pub use ambient::{current_transaction_status, has_current_transaction, AmbientScope};
pub use manager::TransactionManager;
pub use status::TransactionStatus;
