//! Rollback rules and the engine that picks the decisive one.
//!
//! A rule matches an error class when the class's fully-qualified name, or
//! the name of one of its supertypes, contains the rule's pattern. The rule
//! matching closest to the concrete class wins. When several rules match at
//! the same depth, the one registered first wins.
//!
//! If no rule matches, the default policy applies: unchecked and fatal
//! errors roll back, checked errors commit.

use crate::error::ConfigError;
use crate::error_class::{ErrorCategory, ErrorClass};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a rule that commits despite the error.
pub const PREFIX_COMMIT_RULE: char = '+';

/// Prefix marking a rule that forces rollback.
pub const PREFIX_ROLLBACK_RULE: char = '-';

/// What a matching rule asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Roll back the transaction.
    RollBack,
    /// Commit the transaction despite the error.
    Commit,
}

/// Outcome of a rollback decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// Roll the transaction back.
    RollBack,
    /// Commit the transaction.
    Commit,
}

impl Decision {
    /// Returns true for [`Decision::RollBack`].
    #[must_use]
    pub const fn is_rollback(self) -> bool {
        matches!(self, Self::RollBack)
    }
}

/// A pattern and polarity deciding whether an error type forces rollback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollbackRule {
    pattern: String,
    polarity: Polarity,
}

impl RollbackRule {
    /// Creates a rule that rolls back on errors matching `pattern`.
    pub fn rollback_on(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(pattern, Polarity::RollBack)
    }

    /// Creates a rule that commits despite errors matching `pattern`.
    pub fn no_rollback_on(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(pattern, Polarity::Commit)
    }

    /// Creates a rule with the given polarity.
    pub fn new(pattern: impl Into<String>, polarity: Polarity) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(ConfigError::EmptyRulePattern);
        }
        Ok(Self { pattern, polarity })
    }

    /// Creates a rule from its prefixed form: `-Pattern` rolls back,
    /// `+Pattern` commits.
    pub fn from_prefixed(rule: &str) -> Result<Self, ConfigError> {
        let rule = rule.trim();
        let mut chars = rule.chars();
        let polarity = match chars.next() {
            Some(PREFIX_ROLLBACK_RULE) => Polarity::RollBack,
            Some(PREFIX_COMMIT_RULE) => Polarity::Commit,
            _ => {
                return Err(ConfigError::InvalidRulePrefix {
                    rule: rule.to_string(),
                })
            }
        };
        Self::new(chars.as_str(), polarity)
    }

    /// Returns the pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the polarity.
    #[must_use]
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Returns true if this rule asks for rollback.
    #[must_use]
    pub fn is_rollback(&self) -> bool {
        self.polarity == Polarity::RollBack
    }

    /// Returns how many supertype steps from `class` the first match is,
    /// or `None` if nothing up to the root matches.
    #[must_use]
    pub fn depth(&self, class: &ErrorClass) -> Option<usize> {
        class
            .ancestors()
            .position(|ancestor| ancestor.name().contains(self.pattern.as_str()))
    }
}

impl fmt::Display for RollbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.polarity {
            Polarity::RollBack => PREFIX_ROLLBACK_RULE,
            Polarity::Commit => PREFIX_COMMIT_RULE,
        };
        write!(f, "{prefix}{}", self.pattern)
    }
}

/// How a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// A rule matched.
    Rule {
        /// The winning rule.
        rule: &'a RollbackRule,
        /// Its position in the rule list.
        index: usize,
        /// The depth at which it matched.
        depth: usize,
    },
    /// No rule matched; the category decided.
    DefaultPolicy {
        /// Category of the error class.
        category: ErrorCategory,
    },
}

impl Verdict<'_> {
    /// Returns the decision this verdict stands for.
    #[must_use]
    pub fn decision(&self) -> Decision {
        let rolls_back = match self {
            Self::Rule { rule, .. } => rule.is_rollback(),
            Self::DefaultPolicy { category } => category.rolls_back_by_default(),
        };
        if rolls_back {
            Decision::RollBack
        } else {
            Decision::Commit
        }
    }
}

/// Finds the decisive rule for `class`.
///
/// Shallowest match wins; on equal depth the earlier rule wins.
pub fn evaluate<'a>(rules: &'a [RollbackRule], class: &ErrorClass) -> Verdict<'a> {
    let mut winner: Option<(usize, usize)> = None;
    for (index, rule) in rules.iter().enumerate() {
        let Some(depth) = rule.depth(class) else {
            continue;
        };
        if winner.map_or(true, |(_, best)| depth < best) {
            winner = Some((index, depth));
        }
        if matches!(winner, Some((_, 0))) {
            // Later rules can only tie.
            break;
        }
    }

    match winner {
        Some((index, depth)) => Verdict::Rule {
            rule: &rules[index],
            index,
            depth,
        },
        None => Verdict::DefaultPolicy {
            category: class.category(),
        },
    }
}

/// Decides between rollback and commit for `class`.
#[must_use]
pub fn decide(rules: &[RollbackRule], class: &ErrorClass) -> Decision {
    evaluate(rules, class).decision()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Tree {
        exception: Arc<ErrorClass>,
        runtime: Arc<ErrorClass>,
        illegal_state: Arc<ErrorClass>,
        servlet: Arc<ErrorClass>,
        fatal: Arc<ErrorClass>,
    }

    fn tree() -> Tree {
        let throwable = ErrorClass::root("java.lang.Throwable", ErrorCategory::Checked);
        let exception = ErrorClass::subclass(&throwable, "java.lang.Exception");
        let runtime = ErrorClass::subclass_with_category(
            &exception,
            "java.lang.RuntimeException",
            ErrorCategory::Unchecked,
        );
        let illegal_state = ErrorClass::subclass(&runtime, "java.lang.IllegalStateException");
        let servlet = ErrorClass::subclass(&exception, "javax.servlet.ServletException");
        let fatal =
            ErrorClass::subclass_with_category(&throwable, "java.lang.Error", ErrorCategory::Fatal);
        Tree {
            exception,
            runtime,
            illegal_state,
            servlet,
            fatal,
        }
    }

    fn rules(specs: &[&str]) -> Vec<RollbackRule> {
        specs
            .iter()
            .map(|s| RollbackRule::from_prefixed(s).unwrap())
            .collect()
    }

    #[test]
    fn depth_walks_supertypes() {
        let t = tree();
        let rule = RollbackRule::rollback_on("java.lang.Exception").unwrap();
        assert_eq!(rule.depth(&t.exception), Some(0));
        assert_eq!(rule.depth(&t.runtime), Some(1));
        assert_eq!(rule.depth(&t.illegal_state), Some(2));
        assert_eq!(rule.depth(&t.fatal), None);
    }

    #[test]
    fn substring_match_is_case_sensitive() {
        let t = tree();
        let rule = RollbackRule::rollback_on("illegalstate").unwrap();
        assert_eq!(rule.depth(&t.illegal_state), None);
        let rule = RollbackRule::rollback_on("IllegalState").unwrap();
        assert_eq!(rule.depth(&t.illegal_state), Some(0));
    }

    #[test]
    fn shallower_rule_wins() {
        let t = tree();
        let set = rules(&["-java.lang.RuntimeException", "+java.lang.IllegalStateException"]);
        let verdict = evaluate(&set, &t.illegal_state);
        assert_eq!(verdict.decision(), Decision::Commit);
        assert!(matches!(verdict, Verdict::Rule { index: 1, depth: 0, .. }));

        // Order does not matter when depths differ.
        let set = rules(&["+IllegalStateException", "-RuntimeException"]);
        assert_eq!(decide(&set, &t.illegal_state), Decision::Commit);
        assert_eq!(decide(&set, &t.runtime), Decision::RollBack);
    }

    #[test]
    fn equal_depth_first_registered_wins() {
        let t = tree();
        let set = rules(&["+IllegalState", "-StateException"]);
        assert_eq!(decide(&set, &t.illegal_state), Decision::Commit);

        let set = rules(&["-StateException", "+IllegalState"]);
        assert_eq!(decide(&set, &t.illegal_state), Decision::RollBack);
    }

    #[test]
    fn servlet_exception_commits_while_exception_rolls_back() {
        let t = tree();
        let set = rules(&["-java.lang.Exception", "+ServletException"]);
        assert_eq!(decide(&set, &t.exception), Decision::RollBack);
        assert_eq!(decide(&set, &t.servlet), Decision::Commit);
    }

    #[test]
    fn default_policy_without_rules() {
        let t = tree();
        assert_eq!(decide(&[], &t.runtime), Decision::RollBack);
        assert_eq!(decide(&[], &t.fatal), Decision::RollBack);
        assert_eq!(decide(&[], &t.exception), Decision::Commit);
        assert!(matches!(
            evaluate(&[], &t.servlet),
            Verdict::DefaultPolicy {
                category: ErrorCategory::Checked
            }
        ));
    }

    #[test]
    fn unmatched_rules_fall_back_to_default() {
        let t = tree();
        let set = rules(&["+ServletException"]);
        assert_eq!(decide(&set, &t.runtime), Decision::RollBack);
    }

    #[test]
    fn prefixed_parsing() {
        let rule = RollbackRule::from_prefixed("+Foo").unwrap();
        assert_eq!(rule.polarity(), Polarity::Commit);
        assert_eq!(rule.pattern(), "Foo");
        assert_eq!(rule.to_string(), "+Foo");

        assert_eq!(
            RollbackRule::from_prefixed("Foo"),
            Err(ConfigError::InvalidRulePrefix {
                rule: "Foo".to_string()
            })
        );
        assert_eq!(
            RollbackRule::from_prefixed("-"),
            Err(ConfigError::EmptyRulePattern)
        );
    }

    proptest::proptest! {
        #[test]
        fn exact_ancestor_name_matches_no_deeper_than_its_position(
            names in proptest::collection::vec("[A-Z][a-z]{1,4}", 1..6),
            pick in 0usize..6,
        ) {
            let mut class = ErrorClass::root(format!("{}0", names[0]), ErrorCategory::Checked);
            for (i, name) in names.iter().enumerate().skip(1) {
                class = ErrorClass::subclass(&class, format!("{name}{i}"));
            }
            let chain: Vec<&ErrorClass> = class.ancestors().collect();
            let position = pick % chain.len();
            let rule = RollbackRule::rollback_on(chain[position].name()).unwrap();

            let depth = rule.depth(&class);
            proptest::prop_assert!(depth.is_some_and(|d| d <= position));
            proptest::prop_assert_eq!(decide(&[rule], &class), Decision::RollBack);
        }
    }
}
