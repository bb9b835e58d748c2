//! Attribute resolution against the sample bean catalog.

use demarc_core::{
    AttributeResolver, CachedAttribute, MapMetadataProvider, MetadataEntry, OperationKey,
    Propagation, ResolverConfig, RollbackRule, TransactionAttribute, TransactionDefinition, TxError,
};
use demarc_testkit::prelude::*;
use std::sync::Arc;

struct Harness {
    beans: BeanCatalog,
    map: Arc<MapMetadataProvider>,
    counting: Arc<CountingProvider>,
    resolver: AttributeResolver,
}

fn harness() -> Harness {
    harness_with(ResolverConfig::default())
}

fn harness_with(config: ResolverConfig) -> Harness {
    init_test_logging();
    let beans = BeanCatalog::new();
    let map = Arc::new(MapMetadataProvider::new());
    let counting = Arc::new(CountingProvider::new(map.clone()));
    let resolver = AttributeResolver::with_config(beans.catalog.clone(), counting.clone(), config);
    Harness {
        beans,
        map,
        counting,
        resolver,
    }
}

fn attribute(propagation: Propagation) -> TransactionAttribute {
    TransactionAttribute::new(TransactionDefinition::new().propagation(propagation))
}

fn entry(propagation: Propagation) -> MetadataEntry {
    MetadataEntry::from(attribute(propagation))
}

#[test]
fn interface_operation_attribute_applies_to_implementation() {
    let h = harness();
    h.map
        .register_operation(h.beans.interface_ops.get_age, [entry(Propagation::Mandatory)]);

    let found = h
        .resolver
        .resolve(h.beans.interface_ops.get_age, Some(h.beans.test_bean))
        .unwrap()
        .unwrap();
    assert_eq!(*found, attribute(Propagation::Mandatory));
}

#[test]
fn class_operation_beats_interface_operation() {
    let h = harness();
    h.map
        .register_operation(h.beans.interface_ops.get_age, [entry(Propagation::Mandatory)]);
    h.map
        .register_operation(h.beans.class_ops.get_age, [entry(Propagation::RequiresNew)]);

    let found = h
        .resolver
        .resolve(h.beans.interface_ops.get_age, Some(h.beans.test_bean))
        .unwrap()
        .unwrap();
    assert_eq!(found.definition().propagation, Propagation::RequiresNew);
}

#[test]
fn implementing_class_level_attribute_beats_interface_operation() {
    let h = harness();
    h.map
        .register_operation(h.beans.interface_ops.get_age, [entry(Propagation::Mandatory)]);
    h.map
        .register_type(h.beans.test_bean, [entry(Propagation::Supports)]);

    let found = h
        .resolver
        .resolve(h.beans.interface_ops.get_age, Some(h.beans.test_bean))
        .unwrap()
        .unwrap();
    assert_eq!(found.definition().propagation, Propagation::Supports);

    let type_lookups = h.counting.lookups_for_type(h.beans.test_bean);
    assert_eq!(type_lookups, 1);
    h.resolver
        .resolve(h.beans.interface_ops.get_age, Some(h.beans.test_bean))
        .unwrap();
    assert_eq!(h.counting.lookups_for_type(h.beans.test_bean), type_lookups);
    assert_eq!(h.counting.lookups_for_type(h.beans.i_test_bean), 0);
}

#[test]
fn interface_level_attribute_is_the_last_resort() {
    let h = harness();
    h.map
        .register_type(h.beans.i_test_bean, [entry(Propagation::Never)]);

    let found = h
        .resolver
        .resolve(h.beans.interface_ops.set_name, Some(h.beans.test_bean))
        .unwrap()
        .unwrap();
    assert_eq!(found.definition().propagation, Propagation::Never);
}

#[test]
fn inherited_implementation_is_resolved_through_its_declaring_class() {
    let h = harness();
    h.map
        .register_type(h.beans.test_bean, [entry(Propagation::Nested)]);

    let found = h
        .resolver
        .resolve(h.beans.interface_ops.get_age, Some(h.beans.inheriting_bean))
        .unwrap()
        .unwrap();
    assert_eq!(found.definition().propagation, Propagation::Nested);
}

#[test]
fn first_attribute_among_other_entries_wins() {
    let h = harness();
    h.map.register_operation(
        h.beans.class_ops.get_name,
        [
            MetadataEntry::Other("bean-validation".into()),
            entry(Propagation::RequiresNew),
            entry(Propagation::Never),
        ],
    );

    let found = h
        .resolver
        .resolve(h.beans.class_ops.get_name, None)
        .unwrap()
        .unwrap();
    assert_eq!(found.definition().propagation, Propagation::RequiresNew);
}

#[test]
fn overloaded_operations_resolve_independently() {
    let h = harness();
    h.map
        .register_operation(h.beans.set_age_text, [entry(Propagation::RequiresNew)]);

    let text = h
        .resolver
        .resolve(h.beans.set_age_text, Some(h.beans.overloaded_bean))
        .unwrap();
    let int = h
        .resolver
        .resolve(h.beans.interface_ops.set_age, Some(h.beans.overloaded_bean))
        .unwrap();
    assert!(text.is_some());
    assert!(int.is_none());
}

#[test]
fn rollback_rule_entries_are_attached() {
    let h = harness();
    let tree = ErrorTree::new();
    h.map.register_operation(
        h.beans.class_ops.set_age,
        [
            MetadataEntry::from(RollbackRule::no_rollback_on("IllegalState").unwrap()),
            MetadataEntry::from(TransactionAttribute::rule_based(
                TransactionDefinition::new(),
                vec![RollbackRule::rollback_on("Servlet").unwrap()],
            )),
            MetadataEntry::from(RollbackRule::rollback_on("java.io").unwrap()),
        ],
    );

    let found = h
        .resolver
        .resolve(h.beans.class_ops.set_age, None)
        .unwrap()
        .unwrap();
    let patterns: Vec<_> = found.rules().iter().map(RollbackRule::pattern).collect();
    assert_eq!(patterns, ["Servlet", "IllegalState", "java.io"]);

    assert!(found.rollback_on(&raise(&tree.servlet, "bad request")));
    assert!(found.rollback_on(&raise(&tree.io, "disk")));
    assert!(!found.rollback_on(&raise(&tree.illegal_state, "state")));
    assert!(found.rollback_on(&raise(&tree.my_runtime, "default policy")));
    assert!(!found.rollback_on(&raise(&tree.exception, "checked")));
}

#[test]
fn repeated_resolution_is_shared_and_computed_once() {
    let h = harness();
    h.map
        .register_operation(h.beans.interface_ops.get_age, [entry(Propagation::Required)]);

    let first = h
        .resolver
        .resolve(h.beans.interface_ops.get_age, Some(h.beans.test_bean))
        .unwrap()
        .unwrap();
    let lookups = h.counting.total_lookups();
    for _ in 0..10 {
        let again = h
            .resolver
            .resolve(h.beans.interface_ops.get_age, Some(h.beans.test_bean))
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
    assert_eq!(h.counting.total_lookups(), lookups);
}

#[test]
fn non_transactional_result_is_cached() {
    let h = harness();
    let op = h.beans.class_ops.get_name;

    assert!(h.resolver.resolve(op, None).unwrap().is_none());
    let lookups = h.counting.total_lookups();
    assert!(lookups > 0);
    assert!(h.resolver.resolve(op, None).unwrap().is_none());
    assert_eq!(h.counting.total_lookups(), lookups);
    assert!(matches!(
        h.resolver.cached(&OperationKey::new(op, None)),
        Some(CachedAttribute::NotTransactional)
    ));
}

#[test]
fn distinct_implementing_types_are_distinct_keys() {
    let h = harness();
    h.map
        .register_type(h.beans.test_bean, [entry(Propagation::Required)]);
    let op = h.beans.interface_ops.get_age;

    assert!(h.resolver.resolve(op, None).unwrap().is_none());
    assert!(h.resolver.resolve(op, Some(h.beans.test_bean)).unwrap().is_some());
    assert_eq!(h.resolver.cache_len(), 2);
}

#[test]
fn provider_failures_are_not_cached() {
    let h = harness();
    let op = h.beans.class_ops.get_age;
    h.map.register_operation(op, [entry(Propagation::Required)]);

    h.counting.set_failing(true);
    assert!(matches!(
        h.resolver.resolve(op, None),
        Err(TxError::Provider(_))
    ));
    assert_eq!(h.resolver.cache_len(), 0);

    h.counting.set_failing(false);
    assert!(h.resolver.resolve(op, None).unwrap().is_some());
}

#[test]
fn restricted_operations_can_be_excluded() {
    let h = harness_with(ResolverConfig::new().public_operations_only(true));
    h.map
        .register_type(h.beans.test_bean, [entry(Propagation::Required)]);

    assert!(h.resolver.resolve(h.beans.reset, None).unwrap().is_none());
    assert!(h
        .resolver
        .resolve(h.beans.class_ops.get_age, None)
        .unwrap()
        .is_some());
}

#[test]
fn resolved_attribute_snapshot_survives_json() {
    let h = harness();
    h.map.register_operation(
        h.beans.class_ops.set_name,
        [MetadataEntry::from(TransactionAttribute::rule_based(
            TransactionDefinition::new().propagation(Propagation::RequiresNew).timeout(30),
            vec![RollbackRule::no_rollback_on("java.io").unwrap()],
        ))],
    );
    let found = h
        .resolver
        .resolve(h.beans.class_ops.set_name, None)
        .unwrap()
        .unwrap();

    let json = serde_json::to_string(&*found).unwrap();
    let back: TransactionAttribute = serde_json::from_str(&json).unwrap();
    assert_eq!(back, *found);
    assert_eq!(
        back.to_string(),
        "PROPAGATION_REQUIRES_NEW,ISOLATION_DEFAULT,timeout_30,+java.io"
    );
}
