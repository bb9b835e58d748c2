//! Catalog of intercepted types and operations.
//!
//! The catalog is the static picture of the application the interceptor
//! wraps: which types exist, how they extend each other, and which
//! operations each declares. It is assembled once with a
//! [`CatalogBuilder`] and is immutable afterwards.
//!
//! While building, every type gets an override table mapping each operation
//! it inherits to the implementation it actually dispatches to. Finding the
//! most specific operation for a runtime type is then a single map lookup.

mod builder;

pub use builder::CatalogBuilder;

use crate::types::{OperationId, TypeKey};
use std::collections::HashMap;
use std::fmt;

/// What kind of type a catalog entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Declares operations without implementing them.
    Interface,
    /// Partially implemented, never instantiated.
    Abstract,
    /// A type that calls are dispatched on at runtime.
    Concrete,
}

impl TypeKind {
    /// Returns true for interfaces.
    #[must_use]
    pub const fn is_interface(self) -> bool {
        matches!(self, Self::Interface)
    }
}

/// Whether an operation is part of its type's public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Callable by anyone.
    Public,
    /// Internal to the type or its package.
    Restricted,
}

/// An operation declared on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    id: OperationId,
    name: String,
    params: Vec<String>,
    declaring_type: TypeKey,
    visibility: Visibility,
}

impl Operation {
    /// Returns the operation ID.
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter type names.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the type that declares this operation.
    #[must_use]
    pub fn declaring_type(&self) -> TypeKey {
        self.declaring_type
    }

    /// Returns the visibility.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns true for public operations.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Returns the signature, e.g. `getAge(int)`.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.params.join(","))
    }

    fn same_signature(&self, other: &Operation) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// A type known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    key: TypeKey,
    name: String,
    kind: TypeKind,
    supertypes: Vec<TypeKey>,
    operations: Vec<OperationId>,
}

impl TypeInfo {
    /// Returns the type key.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the fully-qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns the direct supertypes in declaration order.
    #[must_use]
    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    /// Returns the operations declared directly on this type.
    #[must_use]
    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }
}

/// Immutable catalog of types, operations and override tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    types: Vec<TypeInfo>,
    operations: Vec<Operation>,
    by_name: HashMap<String, TypeKey>,
    /// (runtime type, inherited operation) -> dispatched operation.
    overrides: HashMap<(TypeKey, OperationId), OperationId>,
}

impl Catalog {
    /// Starts building a catalog.
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Returns the type for a key.
    #[must_use]
    pub fn type_info(&self, key: TypeKey) -> Option<&TypeInfo> {
        self.types.get(key.index())
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn type_by_name(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Returns the operation for an ID.
    #[must_use]
    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(id.index())
    }

    /// Finds an operation declared directly on `ty` by name and parameters.
    #[must_use]
    pub fn find_operation(&self, ty: TypeKey, name: &str, params: &[&str]) -> Option<OperationId> {
        let info = self.type_info(ty)?;
        info.operations.iter().copied().find(|&id| {
            let op = &self.operations[id.index()];
            op.name == name && op.params.iter().map(String::as_str).eq(params.iter().copied())
        })
    }

    /// Returns the operation a call to `operation` dispatches to on
    /// `implementing_type`.
    ///
    /// Returns `operation` itself when no type is given, or when the type
    /// neither overrides nor inherits it.
    #[must_use]
    pub fn most_specific(
        &self,
        operation: OperationId,
        implementing_type: Option<TypeKey>,
    ) -> OperationId {
        implementing_type
            .and_then(|ty| self.overrides.get(&(ty, operation)).copied())
            .unwrap_or(operation)
    }

    /// Returns the number of types.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Describes an operation for log output.
    #[must_use]
    pub fn describe(&self, id: OperationId) -> String {
        match self.operation(id) {
            Some(op) => {
                let owner = self
                    .type_info(op.declaring_type)
                    .map_or("?", |info| info.name.as_str());
                format!("operation '{}' in type [{}]", op.name, owner)
            }
            None => format!("unknown {id}"),
        }
    }
}
