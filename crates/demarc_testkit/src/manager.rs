//! A recording transaction manager.
//!
//! [`RecordingTransactionManager`] keeps no resources. It hands out fresh
//! statuses, records every call, and follows the usual platform-manager
//! rules closely enough to exercise the interceptor:
//!
//! - an existing transaction is discovered through the ambient status,
//! - `Required`, `Supports` and `Mandatory` join it, other propagations start
//!   a new one,
//! - `Mandatory` without, and `Never` with, an existing transaction fail,
//! - committing a rollback-only status rolls back instead,
//! - a participant that fails marks the outer transaction rollback-only,
//!   which turns the outer commit into an unexpected rollback.

use demarc_core::{
    current_transaction_status, Propagation, TransactionAttribute, TransactionId,
    TransactionManager, TransactionStatus, TxError, TxResult,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One recorded manager call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// A transaction was begun (`joined == false`) or joined.
    Begin {
        /// Transaction ID.
        id: TransactionId,
        /// Requested propagation.
        propagation: Propagation,
        /// True if an existing transaction was joined.
        joined: bool,
    },
    /// A new transaction was committed.
    Commit(TransactionId),
    /// A new transaction was rolled back.
    Rollback(TransactionId),
    /// A participant finished without touching the outer transaction.
    ParticipantCommit(TransactionId),
    /// A participant marked the outer transaction rollback-only.
    ParticipantRollback(TransactionId),
}

#[derive(Debug, Default)]
struct Faults {
    begin: Option<TxError>,
    commit: Option<TxError>,
    rollback: Option<TxError>,
}

/// A [`TransactionManager`] that records what it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingTransactionManager {
    next_id: AtomicU64,
    events: Mutex<Vec<ManagerEvent>>,
    attributes: Mutex<Vec<TransactionAttribute>>,
    global_rollback_only: Mutex<HashSet<TransactionId>>,
    faults: Mutex<Faults>,
}

impl RecordingTransactionManager {
    /// Creates a manager with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `begin` fail with `error`.
    pub fn fail_next_begin(&self, error: TxError) {
        self.faults.lock().begin = Some(error);
    }

    /// Makes the next `commit` fail with `error`.
    pub fn fail_next_commit(&self, error: TxError) {
        self.faults.lock().commit = Some(error);
    }

    /// Makes the next `rollback` fail with `error`.
    pub fn fail_next_rollback(&self, error: TxError) {
        self.faults.lock().rollback = Some(error);
    }

    /// Returns all recorded calls in order.
    pub fn events(&self) -> Vec<ManagerEvent> {
        self.events.lock().clone()
    }

    /// Returns the attributes passed to `begin`, in order.
    pub fn attributes(&self) -> Vec<TransactionAttribute> {
        self.attributes.lock().clone()
    }

    /// Returns the number of `begin` calls that succeeded.
    pub fn begins(&self) -> usize {
        self.count(|e| matches!(e, ManagerEvent::Begin { .. }))
    }

    /// Returns the number of new transactions committed.
    pub fn commits(&self) -> usize {
        self.count(|e| matches!(e, ManagerEvent::Commit(_)))
    }

    /// Returns the number of new transactions rolled back.
    pub fn rollbacks(&self) -> usize {
        self.count(|e| matches!(e, ManagerEvent::Rollback(_)))
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        self.events.lock().clear();
        self.attributes.lock().clear();
    }

    fn count(&self, pred: impl Fn(&ManagerEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    fn record(&self, event: ManagerEvent) {
        tracing::trace!(?event, "transaction manager call");
        self.events.lock().push(event);
    }

    fn complete(status: &TransactionStatus) -> TxResult<()> {
        if status.mark_completed() {
            Ok(())
        } else {
            Err(TxError::illegal_state(format!(
                "transaction {} is already completed",
                status.id()
            )))
        }
    }
}

impl TransactionManager for RecordingTransactionManager {
    fn begin(&self, attribute: &TransactionAttribute) -> TxResult<Arc<TransactionStatus>> {
        if let Some(error) = self.faults.lock().begin.take() {
            return Err(error);
        }

        let propagation = attribute.definition().propagation;
        let existing = current_transaction_status().ok();
        match (propagation, &existing) {
            (Propagation::Never, Some(_)) => {
                return Err(TxError::illegal_state(
                    "existing transaction found for transaction marked with propagation 'never'",
                ))
            }
            (Propagation::Mandatory, None) => {
                return Err(TxError::illegal_state(
                    "no existing transaction found for transaction marked with propagation 'mandatory'",
                ))
            }
            _ => {}
        }

        let joins = matches!(
            propagation,
            Propagation::Required | Propagation::Supports | Propagation::Mandatory
        );
        let status = match existing {
            Some(outer) if joins => TransactionStatus::new(outer.id(), false),
            _ => TransactionStatus::new(
                TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
                true,
            ),
        };

        self.attributes.lock().push(attribute.clone());
        self.record(ManagerEvent::Begin {
            id: status.id(),
            propagation,
            joined: !status.is_new_transaction(),
        });
        Ok(Arc::new(status))
    }

    fn commit(&self, status: &TransactionStatus) -> TxResult<()> {
        if let Some(error) = self.faults.lock().commit.take() {
            return Err(error);
        }
        Self::complete(status)?;

        if !status.is_new_transaction() {
            if status.is_rollback_only() {
                self.global_rollback_only.lock().insert(status.id());
                self.record(ManagerEvent::ParticipantRollback(status.id()));
            } else {
                self.record(ManagerEvent::ParticipantCommit(status.id()));
            }
            return Ok(());
        }

        if status.is_rollback_only() {
            self.global_rollback_only.lock().remove(&status.id());
            self.record(ManagerEvent::Rollback(status.id()));
            return Ok(());
        }
        if self.global_rollback_only.lock().remove(&status.id()) {
            self.record(ManagerEvent::Rollback(status.id()));
            return Err(TxError::unexpected_rollback(
                "transaction rolled back because it has been marked as rollback-only",
            ));
        }
        self.record(ManagerEvent::Commit(status.id()));
        Ok(())
    }

    fn rollback(&self, status: &TransactionStatus) -> TxResult<()> {
        if let Some(error) = self.faults.lock().rollback.take() {
            return Err(error);
        }
        Self::complete(status)?;

        if status.is_new_transaction() {
            self.global_rollback_only.lock().remove(&status.id());
            self.record(ManagerEvent::Rollback(status.id()));
        } else {
            self.global_rollback_only.lock().insert(status.id());
            self.record(ManagerEvent::ParticipantRollback(status.id()));
        }
        Ok(())
    }
}
