//! Transaction manager seam.

use super::TransactionStatus;
use crate::attribute::TransactionAttribute;
use crate::error::TxResult;
use std::sync::Arc;

/// Performs the actual transaction work against a resource.
///
/// This crate never implements a real manager; it drives one.
///
/// # Contract
///
/// - `begin` starts or joins a transaction according to the attribute's
///   propagation. An existing transaction that is incompatible with it must
///   be reported as [`crate::TxError::IllegalTransactionState`].
/// - `commit` must roll back instead if the status was marked rollback-only.
/// - Any failure is returned as a [`crate::TxError`] for which
///   [`crate::TxError::is_manager_failure`] holds.
pub trait TransactionManager: Send + Sync {
    /// Begins or joins a transaction for `attribute`.
    ///
    /// # Errors
    ///
    /// Returns an error if no transaction can be created or joined.
    fn begin(&self, attribute: &TransactionAttribute) -> TxResult<Arc<TransactionStatus>>;

    /// Commits the transaction behind `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails or turns into a rollback the
    /// manager reports as unexpected.
    fn commit(&self, status: &TransactionStatus) -> TxResult<()>;

    /// Rolls back the transaction behind `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    fn rollback(&self, status: &TransactionStatus) -> TxResult<()>;
}

impl<M: TransactionManager + ?Sized> TransactionManager for Arc<M> {
    fn begin(&self, attribute: &TransactionAttribute) -> TxResult<Arc<TransactionStatus>> {
        (**self).begin(attribute)
    }

    fn commit(&self, status: &TransactionStatus) -> TxResult<()> {
        (**self).commit(status)
    }

    fn rollback(&self, status: &TransactionStatus) -> TxResult<()> {
        (**self).rollback(status)
    }
}
