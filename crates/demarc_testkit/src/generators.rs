//! Property-based test generators using proptest.
//!
//! Provides strategies for error class chains, rollback rule sets and
//! transaction attributes.

use demarc_core::{
    ErrorCategory, ErrorClass, Isolation, Propagation, RollbackRule, TransactionAttribute,
    TransactionDefinition,
};
use proptest::prelude::*;
use std::sync::Arc;

/// Strategy for error categories.
pub fn error_category_strategy() -> impl Strategy<Value = ErrorCategory> {
    prop_oneof![
        Just(ErrorCategory::Checked),
        Just(ErrorCategory::Unchecked),
        Just(ErrorCategory::Fatal),
    ]
}

/// Strategy for propagation behaviors.
pub fn propagation_strategy() -> impl Strategy<Value = Propagation> {
    prop_oneof![
        Just(Propagation::Required),
        Just(Propagation::Supports),
        Just(Propagation::Mandatory),
        Just(Propagation::RequiresNew),
        Just(Propagation::NotSupported),
        Just(Propagation::Never),
        Just(Propagation::Nested),
    ]
}

/// Strategy for isolation levels.
pub fn isolation_strategy() -> impl Strategy<Value = Isolation> {
    prop_oneof![
        Just(Isolation::Default),
        Just(Isolation::ReadUncommitted),
        Just(Isolation::ReadCommitted),
        Just(Isolation::RepeatableRead),
        Just(Isolation::Serializable),
    ]
}

/// Strategy for transaction definitions, including the default timeout.
pub fn definition_strategy() -> impl Strategy<Value = TransactionDefinition> {
    (
        propagation_strategy(),
        isolation_strategy(),
        prop_oneof![Just(-1), 1..600i32],
        any::<bool>(),
    )
        .prop_map(|(propagation, isolation, timeout, read_only)| {
            TransactionDefinition::new()
                .propagation(propagation)
                .isolation(isolation)
                .timeout(timeout)
                .read_only(read_only)
        })
}

/// Strategy for short class-name segments such as `Parse` or `Io`.
pub fn class_segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,5}").expect("Invalid regex")
}

/// Builds a linear chain from `segments`, root first, and returns the leaf.
///
/// Segment `i` becomes the class `gen.<segment><i>`, so names are unique
/// along the chain.
pub fn build_chain(category: ErrorCategory, segments: &[String]) -> Arc<ErrorClass> {
    let mut names = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| format!("gen.{segment}{i}"));
    let root_name = names.next().unwrap_or_else(|| "gen.Root0".to_string());
    names.fold(ErrorClass::root(root_name, category), |parent, name| {
        ErrorClass::subclass(&parent, name)
    })
}

/// Strategy for error class chains of one to six classes, returning the leaf.
pub fn error_chain_strategy() -> impl Strategy<Value = Arc<ErrorClass>> {
    (
        error_category_strategy(),
        prop::collection::vec(class_segment_strategy(), 1..=6),
    )
        .prop_map(|(category, segments)| build_chain(category, &segments))
}

fn rule(pattern: String, rollback: bool) -> RollbackRule {
    let rule = if rollback {
        RollbackRule::rollback_on(pattern)
    } else {
        RollbackRule::no_rollback_on(pattern)
    };
    rule.expect("generated patterns are non-empty")
}

/// Strategy for rule sets with arbitrary patterns.
pub fn rule_set_strategy() -> impl Strategy<Value = Vec<RollbackRule>> {
    prop::collection::vec(
        (class_segment_strategy(), any::<bool>()).prop_map(|(p, rb)| rule(p, rb)),
        0..6,
    )
}

/// Strategy for an error chain together with rules that are likely to match
/// somewhere along it.
pub fn chain_with_rules_strategy() -> impl Strategy<Value = (Arc<ErrorClass>, Vec<RollbackRule>)>
{
    error_chain_strategy().prop_flat_map(|leaf| {
        let names: Vec<String> = leaf.ancestors().map(|c| c.name().to_string()).collect();
        let pattern = prop_oneof![
            prop::sample::select(names),
            class_segment_strategy(),
        ];
        let rules = prop::collection::vec(
            (pattern, any::<bool>()).prop_map(|(p, rb)| rule(p, rb)),
            0..6,
        );
        (Just(leaf), rules)
    })
}

/// Strategy for transaction attributes, rule-based about half of the time.
pub fn attribute_strategy() -> impl Strategy<Value = TransactionAttribute> {
    (definition_strategy(), prop::option::of(rule_set_strategy())).prop_map(
        |(definition, rules)| match rules {
            Some(rules) => TransactionAttribute::rule_based(definition, rules),
            None => TransactionAttribute::new(definition),
        },
    )
}
