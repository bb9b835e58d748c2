//! Core type definitions for demarc.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a transaction handed out by a transaction manager.
///
/// Transaction IDs are monotonically increasing per manager and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Creates a new transaction ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Index of a type inside a [`crate::Catalog`].
///
/// Keys are only meaningful for the catalog that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(pub u32);

impl TypeKey {
    /// Creates a new type key.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type:{}", self.0)
    }
}

/// Index of an operation inside a [`crate::Catalog`].
///
/// Every overload gets its own ID, so two operations sharing a name never
/// share an ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub u32);

impl OperationId {
    /// Creates a new operation ID.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op:{}", self.0)
    }
}

/// Cache key identifying a called operation on a runtime type.
///
/// `implementing_type == None` means "the operation's own declaring type".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationKey {
    /// The operation as it was invoked.
    pub operation: OperationId,
    /// The runtime type the call was dispatched on, if known.
    pub implementing_type: Option<TypeKey>,
}

impl OperationKey {
    /// Creates a new key.
    #[must_use]
    pub const fn new(operation: OperationId, implementing_type: Option<TypeKey>) -> Self {
        Self {
            operation,
            implementing_type,
        }
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.implementing_type {
            Some(ty) => write!(f, "{}@{}", self.operation, ty),
            None => write!(f, "{}", self.operation),
        }
    }
}
