//! Transaction status handle.

use crate::types::TransactionId;
use std::sync::atomic::{AtomicBool, Ordering};

/// Handle for a transaction begun or joined by a [`super::TransactionManager`].
///
/// The manager creates it; the interceptor passes it back on commit or
/// rollback and exposes it to nested code as the ambient status. Code
/// running inside the transaction can request rollback without raising an
/// error via [`TransactionStatus::set_rollback_only`].
#[derive(Debug)]
pub struct TransactionStatus {
    id: TransactionId,
    new_transaction: bool,
    rollback_only: AtomicBool,
    completed: AtomicBool,
}

impl TransactionStatus {
    /// Creates a status for transaction `id`.
    ///
    /// `new_transaction` is false when the call joined an existing transaction.
    #[must_use]
    pub fn new(id: TransactionId, new_transaction: bool) -> Self {
        Self {
            id,
            new_transaction,
            rollback_only: AtomicBool::new(false),
            completed: AtomicBool::new(false),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns true if this call started the transaction.
    #[must_use]
    pub fn is_new_transaction(&self) -> bool {
        self.new_transaction
    }

    /// Marks the transaction so that the only possible outcome is rollback.
    pub fn set_rollback_only(&self) {
        self.rollback_only.store(true, Ordering::SeqCst);
    }

    /// Returns true if the transaction was marked rollback-only.
    #[must_use]
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only.load(Ordering::SeqCst)
    }

    /// Records that the transaction was committed or rolled back.
    ///
    /// Returns false if it had already been completed.
    pub fn mark_completed(&self) -> bool {
        !self.completed.swap(true, Ordering::SeqCst)
    }

    /// Returns true once the transaction was committed or rolled back.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }
}
