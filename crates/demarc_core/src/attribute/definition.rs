//! Propagation, isolation and the transaction definition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timeout value meaning "use the transaction manager's default".
pub const TIMEOUT_DEFAULT: i32 = -1;

/// How a transactional operation relates to an already-active transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Join the current transaction, or create one if none exists.
    #[default]
    Required,
    /// Join the current transaction, or run non-transactionally.
    Supports,
    /// Join the current transaction, failing if none exists.
    Mandatory,
    /// Suspend any current transaction and always start a new one.
    RequiresNew,
    /// Suspend any current transaction and run non-transactionally.
    NotSupported,
    /// Run non-transactionally, failing if a transaction exists.
    Never,
    /// Run in a nested transaction if one exists, else behave like `Required`.
    Nested,
}

impl Propagation {
    /// Returns the canonical descriptor token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "PROPAGATION_REQUIRED",
            Self::Supports => "PROPAGATION_SUPPORTS",
            Self::Mandatory => "PROPAGATION_MANDATORY",
            Self::RequiresNew => "PROPAGATION_REQUIRES_NEW",
            Self::NotSupported => "PROPAGATION_NOT_SUPPORTED",
            Self::Never => "PROPAGATION_NEVER",
            Self::Nested => "PROPAGATION_NESTED",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The visibility guarantee requested from the underlying resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Whatever the resource uses by default.
    #[default]
    Default,
    /// Dirty reads allowed.
    ReadUncommitted,
    /// Only committed data is visible.
    ReadCommitted,
    /// Rows read once stay stable.
    RepeatableRead,
    /// Full serializability.
    Serializable,
}

impl Isolation {
    /// Returns the canonical descriptor token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "ISOLATION_DEFAULT",
            Self::ReadUncommitted => "ISOLATION_READ_UNCOMMITTED",
            Self::ReadCommitted => "ISOLATION_READ_COMMITTED",
            Self::RepeatableRead => "ISOLATION_REPEATABLE_READ",
            Self::Serializable => "ISOLATION_SERIALIZABLE",
        }
    }
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settings passed to a transaction manager on begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDefinition {
    /// Propagation behavior.
    pub propagation: Propagation,
    /// Isolation level.
    pub isolation: Isolation,
    /// Timeout in seconds; negative means the manager's default.
    pub timeout: i32,
    /// Whether the transaction is read-only.
    pub read_only: bool,
}

impl Default for TransactionDefinition {
    fn default() -> Self {
        Self {
            propagation: Propagation::Required,
            isolation: Isolation::Default,
            timeout: TIMEOUT_DEFAULT,
            read_only: false,
        }
    }
}

impl TransactionDefinition {
    /// Creates a definition with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the propagation behavior.
    #[must_use]
    pub const fn propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    /// Sets the isolation level.
    #[must_use]
    pub const fn isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    /// Sets the timeout in seconds.
    #[must_use]
    pub const fn timeout(mut self, seconds: i32) -> Self {
        self.timeout = seconds;
        self
    }

    /// Sets the read-only flag.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Returns true if the timeout defers to the manager's default.
    #[must_use]
    pub const fn has_default_timeout(&self) -> bool {
        self.timeout < 0
    }
}

impl fmt::Display for TransactionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.propagation, self.isolation)?;
        if !self.has_default_timeout() {
            write!(f, ",timeout_{}", self.timeout)?;
        }
        if self.read_only {
            f.write_str(",readOnly")?;
        }
        Ok(())
    }
}
