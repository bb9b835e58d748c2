//! Attribute metadata: the seam between the resolver and wherever
//! attributes are authored.
//!
//! A [`MetadataProvider`] hands out raw entries declared on an operation or
//! a type. The resolver only cares whether an entry is a
//! [`TransactionAttribute`] or a [`RollbackRule`]; everything else is
//! skipped.

mod map;

pub use map::MapMetadataProvider;

use crate::attribute::{RollbackRule, TransactionAttribute};
use crate::catalog::{Operation, TypeInfo};
use crate::error::ProviderError;

/// A raw metadata entry attached to an operation or type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEntry {
    /// A transaction attribute.
    Attribute(TransactionAttribute),
    /// A rollback rule to attach to a rule-based attribute.
    RollbackRule(RollbackRule),
    /// Unrelated metadata, identified by a free-form tag.
    Other(String),
}

impl MetadataEntry {
    /// Returns the attribute if this entry is one.
    #[must_use]
    pub fn as_attribute(&self) -> Option<&TransactionAttribute> {
        match self {
            Self::Attribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    /// Returns the rollback rule if this entry is one.
    #[must_use]
    pub fn as_rollback_rule(&self) -> Option<&RollbackRule> {
        match self {
            Self::RollbackRule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl From<TransactionAttribute> for MetadataEntry {
    fn from(attribute: TransactionAttribute) -> Self {
        Self::Attribute(attribute)
    }
}

impl From<RollbackRule> for MetadataEntry {
    fn from(rule: RollbackRule) -> Self {
        Self::RollbackRule(rule)
    }
}

/// Source of raw attribute metadata.
///
/// Implementations must be `Send + Sync`; the resolver calls them while
/// holding its cache lock, so they must not call back into the resolver.
pub trait MetadataProvider: Send + Sync {
    /// Returns the entries declared directly on `operation`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot be read.
    fn operation_entries(&self, operation: &Operation) -> Result<Vec<MetadataEntry>, ProviderError>;

    /// Returns the entries declared on `ty` itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source cannot be read.
    fn type_entries(&self, ty: &TypeInfo) -> Result<Vec<MetadataEntry>, ProviderError>;
}

/// Picks the first attribute among `entries`, attaching any rollback rules
/// found alongside it if the attribute is rule-based.
#[must_use]
pub fn assemble(entries: Vec<MetadataEntry>) -> Option<TransactionAttribute> {
    let mut attribute = None;
    let mut rules = Vec::new();
    for entry in entries {
        match entry {
            MetadataEntry::Attribute(found) if attribute.is_none() => attribute = Some(found),
            MetadataEntry::RollbackRule(rule) => rules.push(rule),
            _ => {}
        }
    }
    attribute.map(|attribute| attribute.with_additional_rules(rules))
}
