//! Transaction attributes.
//!
//! A [`TransactionAttribute`] is the immutable value an operation resolves
//! to: the [`TransactionDefinition`] passed to the transaction manager plus
//! the [`RollbackPolicy`] consulted when the operation fails.

mod definition;
mod rules;

pub use definition::{Isolation, Propagation, TransactionDefinition, TIMEOUT_DEFAULT};
pub use rules::{
    decide, evaluate, Decision, Polarity, RollbackRule, Verdict, PREFIX_COMMIT_RULE,
    PREFIX_ROLLBACK_RULE,
};

use crate::error_class::Classify;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a failed operation is turned into a rollback or commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Roll back on unchecked and fatal errors only.
    Default,
    /// Consult the rules first; an empty list behaves like `Default`.
    RuleBased(Vec<RollbackRule>),
}

/// Transaction settings for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAttribute {
    definition: TransactionDefinition,
    policy: RollbackPolicy,
}

impl Default for TransactionAttribute {
    fn default() -> Self {
        Self::new(TransactionDefinition::default())
    }
}

impl TransactionAttribute {
    /// Creates an attribute with the default rollback policy.
    #[must_use]
    pub fn new(definition: TransactionDefinition) -> Self {
        Self {
            definition,
            policy: RollbackPolicy::Default,
        }
    }

    /// Creates a rule-based attribute.
    #[must_use]
    pub fn rule_based(definition: TransactionDefinition, rules: Vec<RollbackRule>) -> Self {
        Self {
            definition,
            policy: RollbackPolicy::RuleBased(rules),
        }
    }

    /// Returns a copy carrying `rules` after any rules already attached.
    ///
    /// Attributes with the default policy are returned unchanged.
    #[must_use]
    pub fn with_additional_rules(mut self, rules: impl IntoIterator<Item = RollbackRule>) -> Self {
        if let RollbackPolicy::RuleBased(existing) = &mut self.policy {
            existing.extend(rules);
        }
        self
    }

    /// Returns the definition.
    #[must_use]
    pub fn definition(&self) -> &TransactionDefinition {
        &self.definition
    }

    /// Returns the rollback policy.
    #[must_use]
    pub fn policy(&self) -> &RollbackPolicy {
        &self.policy
    }

    /// Returns true if this attribute consults rollback rules.
    #[must_use]
    pub fn is_rule_based(&self) -> bool {
        matches!(self.policy, RollbackPolicy::RuleBased(_))
    }

    /// Returns the attached rules, empty for the default policy.
    #[must_use]
    pub fn rules(&self) -> &[RollbackRule] {
        match &self.policy {
            RollbackPolicy::Default => &[],
            RollbackPolicy::RuleBased(rules) => rules,
        }
    }

    /// Explains how `error` would be handled.
    pub fn verdict(&self, error: &dyn Classify) -> Verdict<'_> {
        evaluate(self.rules(), error.error_class())
    }

    /// Returns true if `error` should roll the transaction back.
    pub fn rollback_on(&self, error: &dyn Classify) -> bool {
        self.verdict(error).decision().is_rollback()
    }
}

impl fmt::Display for TransactionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.definition)?;
        for rule in self.rules() {
            write!(f, ",{rule}")?;
        }
        Ok(())
    }
}
