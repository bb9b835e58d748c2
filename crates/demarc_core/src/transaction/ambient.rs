//! Ambient transaction status.
//!
//! Each thread has one slot holding the status of the innermost
//! transactional call currently running on it. Entering a call saves the
//! previous value and installs the new one; the [`AmbientScope`] guard puts
//! the previous value back when dropped, on every exit path.

use super::TransactionStatus;
use crate::error::{TxError, TxResult};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

thread_local! {
    static CURRENT: RefCell<Option<Arc<TransactionStatus>>> = const { RefCell::new(None) };
}

/// Returns the status of the innermost transactional call on this thread.
///
/// # Errors
///
/// Returns [`TxError::NoTransaction`] when called outside any intercepted
/// transactional call.
pub fn current_transaction_status() -> TxResult<Arc<TransactionStatus>> {
    CURRENT
        .with(|slot| slot.borrow().clone())
        .ok_or(TxError::NoTransaction)
}

/// Returns true if a transactional call is active on this thread.
#[must_use]
pub fn has_current_transaction() -> bool {
    CURRENT.with(|slot| slot.borrow().is_some())
}

/// Guard that keeps a status installed as the ambient status.
///
/// Not `Send`: the guard must be dropped on the thread that created it.
#[derive(Debug)]
#[must_use = "the previous status is restored as soon as the scope is dropped"]
pub struct AmbientScope {
    previous: Option<Arc<TransactionStatus>>,
    _not_send: PhantomData<*const ()>,
}

impl AmbientScope {
    /// Installs `status`, remembering whatever was installed before.
    pub fn enter(status: Arc<TransactionStatus>) -> Self {
        let previous = CURRENT.with(|slot| slot.borrow_mut().replace(status));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for AmbientScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|slot| *slot.borrow_mut() = previous);
    }
}
