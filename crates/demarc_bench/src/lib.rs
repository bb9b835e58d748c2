//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use demarc_core::{
    ErrorCategory, ErrorClass, RollbackRule, TransactionAttribute, TransactionId,
    TransactionManager, TransactionStatus, TxResult,
};
use demarc_testkit::build_chain;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A manager that does no work, so benchmarks measure the interceptor only.
#[derive(Debug, Default)]
pub struct NoopTransactionManager {
    next_id: AtomicU64,
}

impl TransactionManager for NoopTransactionManager {
    fn begin(&self, _: &TransactionAttribute) -> TxResult<Arc<TransactionStatus>> {
        let id = TransactionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        Ok(Arc::new(TransactionStatus::new(id, true)))
    }

    fn commit(&self, _: &TransactionStatus) -> TxResult<()> {
        Ok(())
    }

    fn rollback(&self, _: &TransactionStatus) -> TxResult<()> {
        Ok(())
    }
}

/// Generate an unchecked error chain `depth` classes deep, returning the leaf.
pub fn error_chain(depth: usize) -> Arc<ErrorClass> {
    let segments: Vec<String> = (0..depth.max(1)).map(|i| format!("Level{i}x")).collect();
    build_chain(ErrorCategory::Unchecked, &segments)
}

/// Generate `count` rules, none of which match [`error_chain`] except the last,
/// which matches its root.
pub fn rules_matching_root(count: usize) -> Vec<RollbackRule> {
    let mut rules: Vec<RollbackRule> = (1..count)
        .filter_map(|i| RollbackRule::no_rollback_on(format!("Unrelated{i}")).ok())
        .collect();
    rules.extend(RollbackRule::rollback_on("Level0x").ok());
    rules
}
