//! Attribute resolution with a fallback chain and a permanent cache.
//!
//! For a call to `operation` on `implementing_type` the resolver looks, in
//! order, at:
//!
//! 1. the most specific operation (the override on the implementing type),
//! 2. the type declaring that operation,
//! 3. the original operation, if it differs from the most specific one,
//! 4. the original operation's declaring type.
//!
//! The first attribute found wins. Results, including "not transactional",
//! are cached per [`OperationKey`] for the resolver's lifetime.

mod cache;

pub use cache::CachedAttribute;

use crate::attribute::TransactionAttribute;
use crate::catalog::{Catalog, Operation};
use crate::config::ResolverConfig;
use crate::error::{TxError, TxResult};
use crate::metadata::{assemble, MetadataProvider};
use crate::types::{OperationId, OperationKey, TypeKey};
use cache::AttributeCache;
use parking_lot::Mutex;
use std::sync::Arc;

/// Resolves and caches transaction attributes.
///
/// ## Locking
///
/// One mutex guards the cache. It is held across the whole
/// check-compute-fill sequence, so each key is computed at most once even
/// under concurrent first calls. Cache hits take the same lock.
pub struct AttributeResolver {
    catalog: Arc<Catalog>,
    provider: Arc<dyn MetadataProvider>,
    config: ResolverConfig,
    cache: Mutex<AttributeCache>,
}

impl AttributeResolver {
    /// Creates a resolver with default configuration.
    pub fn new(catalog: Arc<Catalog>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self::with_config(catalog, provider, ResolverConfig::default())
    }

    /// Creates a resolver with the given configuration.
    pub fn with_config(
        catalog: Arc<Catalog>,
        provider: Arc<dyn MetadataProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            catalog,
            provider,
            config,
            cache: Mutex::new(AttributeCache::new()),
        }
    }

    /// Returns the catalog operations are resolved against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves the attribute for a call to `operation` on `implementing_type`.
    ///
    /// Returns `Ok(None)` for non-transactional operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation or type is not in the catalog, or if
    /// the metadata provider fails. Failures are not cached.
    pub fn resolve(
        &self,
        operation: OperationId,
        implementing_type: Option<TypeKey>,
    ) -> TxResult<Option<Arc<TransactionAttribute>>> {
        let key = OperationKey::new(operation, implementing_type);
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(&key) {
            tracing::trace!(%key, transactional = cached.is_transactional(), "attribute cache hit");
            return Ok(cached.attribute());
        }

        let entry = CachedAttribute::from(self.compute(operation, implementing_type)?);
        match &entry {
            CachedAttribute::Transactional(attribute) => tracing::debug!(
                operation = %self.catalog.describe(operation),
                %attribute,
                "resolved transaction attribute"
            ),
            CachedAttribute::NotTransactional => tracing::debug!(
                operation = %self.catalog.describe(operation),
                "operation is not transactional"
            ),
        }
        let resolved = entry.attribute();
        cache.insert(key, entry);
        Ok(resolved)
    }

    /// Returns the cached result for a key without computing anything.
    #[must_use]
    pub fn cached(&self, key: &OperationKey) -> Option<CachedAttribute> {
        self.cache.lock().get(key).cloned()
    }

    /// Returns the number of cached keys.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn compute(
        &self,
        operation: OperationId,
        implementing_type: Option<TypeKey>,
    ) -> TxResult<Option<TransactionAttribute>> {
        let original = self
            .catalog
            .operation(operation)
            .ok_or(TxError::UnknownOperation(operation))?;
        if let Some(ty) = implementing_type {
            self.catalog
                .type_info(ty)
                .ok_or(TxError::UnknownType(ty))?;
        }

        let specific_id = self.catalog.most_specific(operation, implementing_type);
        let specific = self
            .catalog
            .operation(specific_id)
            .ok_or(TxError::UnknownOperation(specific_id))?;

        if self.config.public_operations_only && !specific.is_public() {
            return Ok(None);
        }

        if let Some(attribute) = self.find_for(specific)? {
            return Ok(Some(attribute));
        }
        if specific_id != operation {
            return self.find_for(original);
        }
        Ok(None)
    }

    /// Looks on the operation itself, then on its declaring type.
    fn find_for(&self, operation: &Operation) -> TxResult<Option<TransactionAttribute>> {
        if let Some(attribute) = assemble(self.provider.operation_entries(operation)?) {
            return Ok(Some(attribute));
        }
        let owner = self
            .catalog
            .type_info(operation.declaring_type())
            .ok_or(TxError::UnknownType(operation.declaring_type()))?;
        Ok(assemble(self.provider.type_entries(owner)?))
    }
}

impl std::fmt::Debug for AttributeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeResolver")
            .field("config", &self.config)
            .field("cached", &self.cache_len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Propagation, TransactionDefinition};
    use crate::catalog::TypeKind;
    use crate::metadata::{MapMetadataProvider, MetadataEntry};

    struct Fixture {
        catalog: Arc<Catalog>,
        provider: Arc<MapMetadataProvider>,
        iface: TypeKey,
        bean: TypeKey,
        i_get_age: OperationId,
        get_age: OperationId,
        hidden: OperationId,
    }

    fn fixture() -> Fixture {
        let mut b = Catalog::builder();
        let iface = b.declare_type("ITestBean", TypeKind::Interface).unwrap();
        let bean = b.declare_type("TestBean", TypeKind::Concrete).unwrap();
        b.extend(bean, iface).unwrap();
        let i_get_age = b.declare_operation(iface, "getAge", &[]).unwrap();
        let get_age = b.declare_operation(bean, "getAge", &[]).unwrap();
        let hidden = b.declare_restricted_operation(bean, "reindex", &[]).unwrap();
        Fixture {
            catalog: Arc::new(b.build().unwrap()),
            provider: Arc::new(MapMetadataProvider::new()),
            iface,
            bean,
            i_get_age,
            get_age,
            hidden,
        }
    }

    fn never() -> TransactionAttribute {
        TransactionAttribute::new(TransactionDefinition::new().propagation(Propagation::Never))
    }

    #[test]
    fn same_handle_returned_twice() {
        let f = fixture();
        f.provider
            .register_operation(f.get_age, [MetadataEntry::from(TransactionAttribute::default())]);
        let resolver = AttributeResolver::new(f.catalog.clone(), f.provider.clone());

        let first = resolver.resolve(f.get_age, Some(f.bean)).unwrap().unwrap();
        let second = resolver.resolve(f.get_age, Some(f.bean)).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.cache_len(), 1);
    }

    #[test]
    fn override_beats_interface_declaration() {
        let f = fixture();
        f.provider
            .register_operation(f.i_get_age, [MetadataEntry::from(TransactionAttribute::default())]);
        f.provider
            .register_operation(f.get_age, [MetadataEntry::from(never())]);
        let resolver = AttributeResolver::new(f.catalog.clone(), f.provider.clone());

        let found = resolver.resolve(f.i_get_age, Some(f.bean)).unwrap().unwrap();
        assert_eq!(*found, never());
    }

    #[test]
    fn specific_type_level_beats_original_operation() {
        let f = fixture();
        f.provider
            .register_operation(f.i_get_age, [MetadataEntry::from(TransactionAttribute::default())]);
        f.provider.register_type(f.bean, [MetadataEntry::from(never())]);
        let resolver = AttributeResolver::new(f.catalog.clone(), f.provider.clone());

        let found = resolver.resolve(f.i_get_age, Some(f.bean)).unwrap().unwrap();
        assert_eq!(*found, never());
    }

    #[test]
    fn falls_back_to_original_declaring_type() {
        let f = fixture();
        f.provider.register_type(f.iface, [MetadataEntry::from(never())]);
        let resolver = AttributeResolver::new(f.catalog.clone(), f.provider.clone());

        let found = resolver.resolve(f.i_get_age, Some(f.bean)).unwrap().unwrap();
        assert_eq!(*found, never());
        // The concrete operation called directly never looks at the interface.
        assert!(resolver.resolve(f.get_age, Some(f.bean)).unwrap().is_none());
    }

    #[test]
    fn negative_result_is_cached_as_sentinel() {
        let f = fixture();
        let resolver = AttributeResolver::new(f.catalog.clone(), f.provider.clone());
        let key = OperationKey::new(f.get_age, None);

        assert_eq!(resolver.cached(&key), None);
        assert!(resolver.resolve(f.get_age, None).unwrap().is_none());
        assert_eq!(resolver.cached(&key), Some(CachedAttribute::NotTransactional));
    }

    #[test]
    fn restricted_operations_skipped_when_configured() {
        let f = fixture();
        f.provider
            .register_operation(f.hidden, [MetadataEntry::from(TransactionAttribute::default())]);

        let open = AttributeResolver::new(f.catalog.clone(), f.provider.clone());
        assert!(open.resolve(f.hidden, Some(f.bean)).unwrap().is_some());

        let strict = AttributeResolver::with_config(
            f.catalog.clone(),
            f.provider.clone(),
            ResolverConfig::new().public_operations_only(true),
        );
        assert!(strict.resolve(f.hidden, Some(f.bean)).unwrap().is_none());
    }

    #[test]
    fn unknown_ids_are_errors() {
        let f = fixture();
        let resolver = AttributeResolver::new(f.catalog.clone(), f.provider.clone());
        let ghost = OperationId::new(77);
        assert_eq!(
            resolver.resolve(ghost, None),
            Err(TxError::UnknownOperation(ghost))
        );
        let ghost_type = TypeKey::new(9);
        assert_eq!(
            resolver.resolve(f.get_age, Some(ghost_type)),
            Err(TxError::UnknownType(ghost_type))
        );
        assert_eq!(resolver.cache_len(), 0);
    }
}
