//! In-memory metadata provider.

use super::{MetadataEntry, MetadataProvider};
use crate::catalog::{Operation, TypeInfo};
use crate::error::ProviderError;
use crate::types::{OperationId, TypeKey};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A metadata provider backed by in-memory maps.
///
/// Suitable for:
/// - Unit and integration tests
/// - Programmatic registration of attributes at startup
///
/// # Thread Safety
///
/// Registration and lookup can happen from any thread. Registering after a
/// resolver has cached a result for the same operation has no effect on that
/// resolver.
#[derive(Debug, Default)]
pub struct MapMetadataProvider {
    operations: RwLock<HashMap<OperationId, Vec<MetadataEntry>>>,
    types: RwLock<HashMap<TypeKey, Vec<MetadataEntry>>>,
}

impl MapMetadataProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entries for an operation.
    pub fn register_operation(
        &self,
        operation: OperationId,
        entries: impl IntoIterator<Item = MetadataEntry>,
    ) {
        self.operations
            .write()
            .insert(operation, entries.into_iter().collect());
    }

    /// Replaces the entries for a type.
    pub fn register_type(&self, ty: TypeKey, entries: impl IntoIterator<Item = MetadataEntry>) {
        self.types.write().insert(ty, entries.into_iter().collect());
    }

    /// Returns the number of operations with registered entries.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.read().len()
    }
}

impl MetadataProvider for MapMetadataProvider {
    fn operation_entries(&self, operation: &Operation) -> Result<Vec<MetadataEntry>, ProviderError> {
        Ok(self
            .operations
            .read()
            .get(&operation.id())
            .cloned()
            .unwrap_or_default())
    }

    fn type_entries(&self, ty: &TypeInfo) -> Result<Vec<MetadataEntry>, ProviderError> {
        Ok(self.types.read().get(&ty.key()).cloned().unwrap_or_default())
    }
}
