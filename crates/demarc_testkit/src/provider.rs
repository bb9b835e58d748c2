//! A counting metadata provider.

use demarc_core::{
    MetadataEntry, MetadataProvider, Operation, OperationId, ProviderError, TypeInfo, TypeKey,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a provider and counts every lookup made through it.
///
/// Used to check that the resolver computes each key at most once.
pub struct CountingProvider {
    inner: Arc<dyn MetadataProvider>,
    operation_lookups: AtomicUsize,
    type_lookups: AtomicUsize,
    per_operation: Mutex<HashMap<OperationId, usize>>,
    per_type: Mutex<HashMap<TypeKey, usize>>,
    failing: AtomicBool,
}

impl CountingProvider {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn MetadataProvider>) -> Self {
        Self {
            inner,
            operation_lookups: AtomicUsize::new(0),
            type_lookups: AtomicUsize::new(0),
            per_operation: Mutex::new(HashMap::new()),
            per_type: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every lookup fail until switched off again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Total operation-level lookups.
    pub fn operation_lookups(&self) -> usize {
        self.operation_lookups.load(Ordering::SeqCst)
    }

    /// Total type-level lookups.
    pub fn type_lookups(&self) -> usize {
        self.type_lookups.load(Ordering::SeqCst)
    }

    /// Total lookups of both kinds.
    pub fn total_lookups(&self) -> usize {
        self.operation_lookups() + self.type_lookups()
    }

    /// Lookups made for one operation.
    pub fn lookups_for_operation(&self, operation: OperationId) -> usize {
        self.per_operation.lock().get(&operation).copied().unwrap_or(0)
    }

    /// Lookups made for one type.
    pub fn lookups_for_type(&self, ty: TypeKey) -> usize {
        self.per_type.lock().get(&ty).copied().unwrap_or(0)
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ProviderError::new("metadata source unavailable"))
        } else {
            Ok(())
        }
    }
}

impl MetadataProvider for CountingProvider {
    fn operation_entries(&self, operation: &Operation) -> Result<Vec<MetadataEntry>, ProviderError> {
        self.operation_lookups.fetch_add(1, Ordering::SeqCst);
        *self.per_operation.lock().entry(operation.id()).or_default() += 1;
        self.check()?;
        self.inner.operation_entries(operation)
    }

    fn type_entries(&self, ty: &TypeInfo) -> Result<Vec<MetadataEntry>, ProviderError> {
        self.type_lookups.fetch_add(1, Ordering::SeqCst);
        *self.per_type.lock().entry(ty.key()).or_default() += 1;
        self.check()?;
        self.inner.type_entries(ty)
    }
}

impl std::fmt::Debug for CountingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingProvider")
            .field("operation_lookups", &self.operation_lookups())
            .field("type_lookups", &self.type_lookups())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::BeanCatalog;
    use demarc_core::MapMetadataProvider;

    #[test]
    fn counts_and_fails_on_request() {
        let beans = BeanCatalog::new();
        let provider = CountingProvider::new(Arc::new(MapMetadataProvider::new()));
        let op = beans.catalog.operation(beans.class_ops.get_age).unwrap();

        assert!(provider.operation_entries(op).unwrap().is_empty());
        provider.set_failing(true);
        assert!(provider.operation_entries(op).is_err());
        provider.set_failing(false);

        assert_eq!(provider.operation_lookups(), 2);
        assert_eq!(provider.lookups_for_operation(beans.class_ops.get_age), 2);
        assert_eq!(provider.type_lookups(), 0);
    }
}
