//! Property tests for rollback rule evaluation.

use demarc_core::attribute::{decide, evaluate};
use demarc_core::{Decision, ErrorClass, RollbackRule, TransactionAttribute, Verdict};
use demarc_testkit::prelude::*;
use proptest::prelude::*;

/// Straightforward model: the depth of every rule, then the first minimum.
fn model(rules: &[RollbackRule], class: &ErrorClass) -> Decision {
    let chain: Vec<&str> = class.ancestors().map(ErrorClass::name).collect();
    let best = rules
        .iter()
        .enumerate()
        .filter_map(|(i, rule)| {
            chain
                .iter()
                .position(|name| name.contains(rule.pattern()))
                .map(|depth| (depth, i))
        })
        .min();
    let rolls_back = match best {
        Some((_, i)) => rules[i].is_rollback(),
        None => class.category().rolls_back_by_default(),
    };
    if rolls_back {
        Decision::RollBack
    } else {
        Decision::Commit
    }
}

#[test]
fn equal_depth_conflict_goes_to_the_first_rule() {
    let tree = ErrorTree::new();
    let rollback = RollbackRule::rollback_on("IllegalState").unwrap();
    let commit = RollbackRule::no_rollback_on("StateException").unwrap();

    let forward = [rollback.clone(), commit.clone()];
    let backward = [commit, rollback];
    assert_eq!(decide(&forward, &tree.illegal_state), Decision::RollBack);
    assert_eq!(decide(&backward, &tree.illegal_state), Decision::Commit);
    assert!(matches!(
        evaluate(&backward, &tree.illegal_state),
        Verdict::Rule { index: 0, depth: 0, .. }
    ));
}

#[test]
fn shallower_match_beats_earlier_rule() {
    let tree = ErrorTree::new();
    let rules = [
        RollbackRule::no_rollback_on("RuntimeException").unwrap(),
        RollbackRule::rollback_on("IllegalStateException").unwrap(),
    ];
    assert_eq!(decide(&rules, &tree.illegal_state), Decision::RollBack);
    assert_eq!(decide(&rules, &tree.my_runtime), Decision::Commit);
}

#[test]
fn prefixed_rules_follow_the_descriptor_contract() {
    let tree = ErrorTree::new();
    let rules = [
        RollbackRule::from_prefixed("+java.io").unwrap(),
        RollbackRule::from_prefixed("-Exception").unwrap(),
    ];
    assert_eq!(decide(&rules, &tree.io), Decision::Commit);
    assert_eq!(decide(&rules, &tree.servlet), Decision::RollBack);
    assert_eq!(decide(&rules, &tree.error), Decision::RollBack);
    assert_eq!(decide(&rules, &tree.throwable), Decision::Commit);
}

#[test]
fn every_class_in_the_tree_follows_its_category_without_rules() {
    let tree = ErrorTree::new();
    for class in tree.all() {
        let expected = if class.category().rolls_back_by_default() {
            Decision::RollBack
        } else {
            Decision::Commit
        };
        assert_eq!(decide(&[], &class), expected, "{}", class.name());
    }
}

#[test]
fn root_pattern_rule_covers_the_whole_tree() {
    let tree = ErrorTree::new();
    let rules = [RollbackRule::no_rollback_on("Throwable").unwrap()];
    for class in tree.all() {
        assert!(matches!(evaluate(&rules, &class), Verdict::Rule { index: 0, .. }));
        assert_eq!(decide(&rules, &class), Decision::Commit, "{}", class.name());
    }
}

proptest! {
    #[test]
    fn attribute_rollback_agrees_with_its_rules(
        attribute in attribute_strategy(),
        leaf in error_chain_strategy(),
    ) {
        let expected = decide(attribute.rules(), &leaf).is_rollback();
        prop_assert_eq!(attribute.rollback_on(&leaf), expected);
    }

    #[test]
    fn evaluation_matches_model((leaf, rules) in chain_with_rules_strategy()) {
        prop_assert_eq!(decide(&rules, &leaf), model(&rules, &leaf));
    }

    #[test]
    fn no_rules_means_default_policy(leaf in error_chain_strategy()) {
        let attribute = TransactionAttribute::rule_based(Default::default(), Vec::new());
        prop_assert_eq!(
            attribute.rollback_on(&leaf),
            leaf.category().rolls_back_by_default()
        );
    }

    #[test]
    fn unmatched_rules_do_not_change_the_outcome(
        (leaf, rules) in chain_with_rules_strategy(),
        rollback in any::<bool>(),
    ) {
        let before = decide(&rules, &leaf);
        let pattern = "zz.never.Matches";
        let extra = if rollback {
            RollbackRule::rollback_on(pattern).unwrap()
        } else {
            RollbackRule::no_rollback_on(pattern).unwrap()
        };
        let mut extended = rules.clone();
        extended.push(extra);
        prop_assert_eq!(decide(&extended, &leaf), before);
    }

    #[test]
    fn exact_name_rule_in_front_always_decides(
        (leaf, rules) in chain_with_rules_strategy(),
        rollback in any::<bool>(),
    ) {
        let exact = if rollback {
            RollbackRule::rollback_on(leaf.name()).unwrap()
        } else {
            RollbackRule::no_rollback_on(leaf.name()).unwrap()
        };
        let mut ordered = vec![exact];
        ordered.extend(rules);
        let expected = if rollback { Decision::RollBack } else { Decision::Commit };
        prop_assert_eq!(decide(&ordered, &leaf), expected);
    }
}
