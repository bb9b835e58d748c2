//! Resolution cache.

use crate::attribute::TransactionAttribute;
use crate::types::OperationKey;
use std::collections::HashMap;
use std::sync::Arc;

/// A memoized resolution result.
///
/// A missing map entry means "not yet computed"; `NotTransactional` means
/// "computed, and there is no attribute".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedAttribute {
    /// The operation runs with this attribute.
    Transactional(Arc<TransactionAttribute>),
    /// The operation is not transactional.
    NotTransactional,
}

impl CachedAttribute {
    /// Returns the attribute, if any.
    #[must_use]
    pub fn attribute(&self) -> Option<Arc<TransactionAttribute>> {
        match self {
            Self::Transactional(attribute) => Some(Arc::clone(attribute)),
            Self::NotTransactional => None,
        }
    }

    /// Returns true for [`CachedAttribute::Transactional`].
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        matches!(self, Self::Transactional(_))
    }
}

impl From<Option<TransactionAttribute>> for CachedAttribute {
    fn from(value: Option<TransactionAttribute>) -> Self {
        match value {
            Some(attribute) => Self::Transactional(Arc::new(attribute)),
            None => Self::NotTransactional,
        }
    }
}

/// Map from operation key to cached result. Entries are never evicted.
pub(crate) type AttributeCache = HashMap<OperationKey, CachedAttribute>;
