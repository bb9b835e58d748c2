//! Error types for demarc.

use crate::types::{OperationId, TypeKey};
use thiserror::Error;

/// Result type for core operations.
pub type TxResult<T> = Result<T, TxError>;

/// Errors raised by the demarcation layer or its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// Setup-time configuration problem.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The attribute metadata provider failed.
    #[error("attribute provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The ambient status was queried outside any transactional call.
    #[error("no aspect-managed transaction status in scope")]
    NoTransaction,

    /// The transaction manager could not start a transaction.
    #[error("could not create transaction: {message}")]
    CannotCreateTransaction {
        /// Description of the failure.
        message: String,
    },

    /// An existing transaction is incompatible with the requested propagation.
    #[error("illegal transaction state: {message}")]
    IllegalTransactionState {
        /// Description of the conflict.
        message: String,
    },

    /// The transaction manager failed during commit or rollback.
    #[error("transaction system failure: {message}")]
    TransactionSystem {
        /// Description of the failure.
        message: String,
    },

    /// A commit turned into a rollback the caller did not ask for.
    #[error("transaction rolled back unexpectedly: {message}")]
    UnexpectedRollback {
        /// Description of the rollback cause.
        message: String,
    },

    /// The operation ID does not belong to the resolver's catalog.
    #[error("unknown operation {0}")]
    UnknownOperation(OperationId),

    /// The type key does not belong to the resolver's catalog.
    #[error("unknown type {0}")]
    UnknownType(TypeKey),
}

impl TxError {
    /// Creates a cannot-create-transaction error.
    pub fn cannot_create(message: impl Into<String>) -> Self {
        Self::CannotCreateTransaction {
            message: message.into(),
        }
    }

    /// Creates an illegal transaction state error.
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalTransactionState {
            message: message.into(),
        }
    }

    /// Creates a transaction system error.
    pub fn system(message: impl Into<String>) -> Self {
        Self::TransactionSystem {
            message: message.into(),
        }
    }

    /// Creates an unexpected rollback error.
    pub fn unexpected_rollback(message: impl Into<String>) -> Self {
        Self::UnexpectedRollback {
            message: message.into(),
        }
    }

    /// Returns true for failures reported by a transaction manager.
    #[must_use]
    pub fn is_manager_failure(&self) -> bool {
        matches!(
            self,
            Self::CannotCreateTransaction { .. }
                | Self::IllegalTransactionState { .. }
                | Self::TransactionSystem { .. }
                | Self::UnexpectedRollback { .. }
        )
    }
}

/// Configuration errors, surfaced while wiring things up and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A type name was declared twice.
    #[error("type `{name}` is already declared")]
    DuplicateType {
        /// The duplicated name.
        name: String,
    },

    /// The same signature was declared twice on one type.
    #[error("operation `{signature}` is already declared on `{type_name}`")]
    DuplicateOperation {
        /// The declaring type.
        type_name: String,
        /// The duplicated signature.
        signature: String,
    },

    /// A type key does not belong to this catalog.
    #[error("unknown type {0}")]
    UnknownType(TypeKey),

    /// The supertype graph contains a cycle.
    #[error("inheritance cycle through `{type_name}`")]
    InheritanceCycle {
        /// A type on the cycle.
        type_name: String,
    },

    /// A type inherits two implementations of one signature at the same distance.
    #[error("ambiguous operation `{signature}` on `{type_name}`")]
    AmbiguousOperation {
        /// The type that inherits both implementations.
        type_name: String,
        /// The ambiguous signature.
        signature: String,
    },

    /// A rollback rule has an empty pattern.
    #[error("rollback rule pattern must not be empty")]
    EmptyRulePattern,

    /// A prefixed rollback rule does not start with `+` or `-`.
    #[error("rollback rule `{rule}` must start with `+` or `-`")]
    InvalidRulePrefix {
        /// The offending text.
        rule: String,
    },

    /// An interceptor was built without a transaction manager.
    #[error("a transaction manager is required")]
    MissingTransactionManager,

    /// An interceptor was built without an attribute source.
    #[error(
        "an attribute source is required: if no operation is transactional, don't intercept at all"
    )]
    MissingAttributeSource,
}

/// Failure reported by a [`crate::MetadataProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    /// Creates a provider error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned from an intercepted call.
///
/// Either the wrapped operation's own error, or a transaction failure that
/// superseded it.
#[derive(Debug, Error)]
pub enum InvocationError<E> {
    /// The error raised by the wrapped operation.
    #[error("{0}")]
    Application(E),

    /// A resolver or transaction manager failure.
    #[error(transparent)]
    Transaction(#[from] TxError),
}

impl<E> InvocationError<E> {
    /// Returns the application error, if that is what was raised.
    pub fn application(&self) -> Option<&E> {
        match self {
            Self::Application(error) => Some(error),
            Self::Transaction(_) => None,
        }
    }

    /// Returns the transaction failure, if that is what was raised.
    pub fn transaction(&self) -> Option<&TxError> {
        match self {
            Self::Application(_) => None,
            Self::Transaction(error) => Some(error),
        }
    }

    /// Consumes the error, returning the application error if present.
    pub fn into_application(self) -> Option<E> {
        match self {
            Self::Application(error) => Some(error),
            Self::Transaction(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_failures_are_distinguishable() {
        assert!(TxError::cannot_create("down").is_manager_failure());
        assert!(TxError::illegal_state("existing").is_manager_failure());
        assert!(!TxError::NoTransaction.is_manager_failure());
        assert!(!TxError::Provider(ProviderError::new("boom")).is_manager_failure());
    }

    #[test]
    fn config_error_converts() {
        let err: TxError = ConfigError::EmptyRulePattern.into();
        assert_eq!(
            err.to_string(),
            "configuration error: rollback rule pattern must not be empty"
        );
    }

    #[test]
    fn invocation_error_accessors() {
        let app: InvocationError<String> = InvocationError::Application("bad".to_string());
        assert_eq!(app.application().map(String::as_str), Some("bad"));
        assert!(app.transaction().is_none());
        assert_eq!(app.to_string(), "bad");

        let tx: InvocationError<String> = TxError::system("disk").into();
        assert!(tx.application().is_none());
        assert_eq!(tx.to_string(), "transaction system failure: disk");
        assert!(tx.into_application().is_none());
    }
}
