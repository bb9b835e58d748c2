//! # Demarc Core
//!
//! Declarative transaction demarcation.
//!
//! This crate provides:
//! - A [`Catalog`] of types and operations with precomputed override resolution
//! - [`TransactionAttribute`]s with rule-based rollback policies
//! - An [`AttributeResolver`] with a four-step fallback chain and a permanent cache
//! - A [`TransactionInterceptor`] that begins, commits and rolls back around a call
//! - Thread-local ambient [`TransactionStatus`] for nested code
//!
//! Real transaction work is delegated to a [`TransactionManager`], and
//! attribute metadata comes from a [`MetadataProvider`].
//!
//! ## Usage
//!
//! ```rust
//! use demarc_core::{
//!     AttributeResolver, Catalog, MapMetadataProvider, MetadataEntry, TransactionAttribute,
//!     TypeKind,
//! };
//! use std::sync::Arc;
//!
//! let mut builder = Catalog::builder();
//! let service = builder.declare_type("OrderService", TypeKind::Concrete).unwrap();
//! let place = builder.declare_operation(service, "place", &["Order"]).unwrap();
//! let catalog = Arc::new(builder.build().unwrap());
//!
//! let provider = Arc::new(MapMetadataProvider::new());
//! provider.register_operation(place, [MetadataEntry::from(TransactionAttribute::default())]);
//!
//! let resolver = AttributeResolver::new(catalog, provider);
//! let attribute = resolver.resolve(place, Some(service)).unwrap();
//! assert!(attribute.is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod catalog;
pub mod config;
pub mod error;
pub mod error_class;
pub mod interceptor;
pub mod metadata;
pub mod resolver;
pub mod transaction;
pub mod types;

pub use attribute::{
    Decision, Isolation, Polarity, Propagation, RollbackPolicy, RollbackRule,
    TransactionAttribute, TransactionDefinition, Verdict, PREFIX_COMMIT_RULE,
    PREFIX_ROLLBACK_RULE, TIMEOUT_DEFAULT,
};
pub use catalog::{Catalog, CatalogBuilder, Operation, TypeInfo, TypeKind, Visibility};
pub use config::{InterceptorConfig, ResolverConfig};
pub use error::{ConfigError, InvocationError, ProviderError, TxError, TxResult};
pub use error_class::{ApplicationError, Classify, ErrorCategory, ErrorClass};
pub use interceptor::{InterceptorBuilder, InvocationPhase, TransactionInterceptor};
pub use metadata::{MapMetadataProvider, MetadataEntry, MetadataProvider};
pub use resolver::{AttributeResolver, CachedAttribute};
pub use transaction::{
    current_transaction_status, has_current_transaction, AmbientScope, TransactionManager,
    TransactionStatus,
};
pub use types::{OperationId, OperationKey, TransactionId, TypeKey};
