//! Per-invocation lifecycle.

use std::fmt;

/// Where a single intercepted call is in its lifecycle.
///
/// ```text
/// NotStarted -> AttributeResolved -> TxActive -> Committed  -> ContextRestored
///                                             -> RolledBack -> ContextRestored
/// ```
///
/// `TxActive -> ContextRestored` is taken when commit or rollback itself
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationPhase {
    /// Nothing has happened yet.
    NotStarted,
    /// The attribute lookup finished.
    AttributeResolved,
    /// A transaction was begun or joined and is installed as ambient status.
    TxActive,
    /// The transaction was committed.
    Committed,
    /// The transaction was rolled back.
    RolledBack,
    /// The previous ambient status is back in place.
    ContextRestored,
}

impl InvocationPhase {
    /// Returns true if moving from `self` to `next` is legal.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::AttributeResolved)
                | (Self::AttributeResolved, Self::TxActive)
                | (Self::TxActive, Self::Committed)
                | (Self::TxActive, Self::RolledBack)
                | (Self::TxActive, Self::ContextRestored)
                | (Self::Committed, Self::ContextRestored)
                | (Self::RolledBack, Self::ContextRestored)
        )
    }

    /// Returns true for the terminal phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ContextRestored)
    }
}

impl fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::AttributeResolved => "attribute-resolved",
            Self::TxActive => "tx-active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
            Self::ContextRestored => "context-restored",
        };
        f.write_str(name)
    }
}
