#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::*;

fn aggregate(value: Value) -> AggregateOptions {
    serde_json::from_value(value).unwrap()
}

fn order_by(value: Value) -> OrderBy {
    serde_json::from_value(value).unwrap()
}

fn rdp(value: Value) -> DerivedProperties {
    serde_json::from_value(value).unwrap()
}

// -- Aggregate options --

#[test]
fn aggregate_built_two_ways_collides() {
    let c = AggregateCanonicalizer::new();

    let literal = aggregate(json!({
        "$select": { "amount:sum": "unordered" },
        "$groupBy": { "region": "exact" },
    }));
    let mut assembled = AggregateOptions::default();
    assembled
        .group_by
        .get_or_insert_with(IndexMap::new)
        .insert("region".to_owned(), json!("exact"));
    assembled
        .select
        .insert("amount:sum".to_owned(), json!("unordered"));

    let a = c.canonicalize(&literal).unwrap();
    let b = c.canonicalize(&assembled).unwrap();

    assert_eq!(a, b);
}

#[test]
fn omitted_null_and_empty_group_by_are_absent() {
    let c = AggregateCanonicalizer::new();

    let omitted = c
        .canonicalize(&aggregate(json!({ "$select": { "$count": "unordered" } })))
        .unwrap();
    let null = c
        .canonicalize(&aggregate(
            json!({ "$select": { "$count": "unordered" }, "$groupBy": null }),
        ))
        .unwrap();
    let empty = c
        .canonicalize(&aggregate(
            json!({ "$select": { "$count": "unordered" }, "$groupBy": {} }),
        ))
        .unwrap();

    assert_eq!(omitted, null);
    assert_eq!(omitted, empty);
    assert_eq!(omitted.group_by, None);
    assert_eq!(
        serde_json::to_value(&*omitted).unwrap(),
        json!({ "$select": { "$count": "unordered" } })
    );
}

#[test]
fn different_groupings_do_not_collide() {
    let c = AggregateCanonicalizer::new();

    let by_region = c
        .canonicalize(&aggregate(
            json!({ "$select": { "$count": "unordered" }, "$groupBy": { "region": "exact" } }),
        ))
        .unwrap();
    let by_owner = c
        .canonicalize(&aggregate(
            json!({ "$select": { "$count": "unordered" }, "$groupBy": { "owner": "exact" } }),
        ))
        .unwrap();

    assert_ne!(by_region, by_owner);
}

// -- Order by --

#[test]
fn order_by_drops_unset_directions() {
    let c = OrderByCanonicalizer::new();

    let a = c
        .canonicalize(&order_by(json!({ "name": "asc", "age": null })))
        .unwrap();
    let b = c.canonicalize(&order_by(json!({ "name": "asc" }))).unwrap();

    assert_eq!(a, b);
    assert_eq!(c.canonicalize(&order_by(json!({ "age": null }))).unwrap(), c.empty().unwrap());
}

#[test]
fn order_by_priority_is_significant() {
    let c = OrderByCanonicalizer::new();

    let name_first = c
        .canonicalize(&order_by(json!({ "name": "asc", "age": "desc" })))
        .unwrap();
    let age_first = c
        .canonicalize(&order_by(json!({ "age": "desc", "name": "asc" })))
        .unwrap();

    assert_ne!(name_first, age_first);
    assert_eq!(name_first.get("age"), Some(&Some(SortDirection::Desc)));
}

// -- Derived properties --

#[test]
fn derived_properties_ignore_entry_order() {
    let c = RdpCanonicalizer::new();

    let a = c
        .canonicalize(&rdp(json!({ "b": { "type": "count" }, "a": { "type": "get" } })))
        .unwrap();
    let b = c
        .canonicalize(&rdp(json!({ "a": { "type": "get" }, "b": { "type": "count" } })))
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(a.keys().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn derived_property_definitions_are_compared_exactly() {
    let c = RdpCanonicalizer::new();

    let count = c.canonicalize(&rdp(json!({ "n": { "type": "count" } }))).unwrap();
    let sum = c.canonicalize(&rdp(json!({ "n": { "type": "sum" } }))).unwrap();

    assert_ne!(count, sum);
}

// -- Pivot and function params --

#[test]
fn pivot_info_is_structural() {
    let c = PivotCanonicalizer::new();
    let pivot = PivotInfo {
        source_type: "Employee".to_owned(),
        source_kind: TypeKind::Object,
        link_name: "lead".to_owned(),
    };

    let a = c.canonicalize(&pivot).unwrap();
    let b = c.canonicalize(&pivot.clone()).unwrap();

    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_value(&*a).unwrap(),
        json!({ "sourceType": "Employee", "sourceKind": "object", "linkName": "lead" })
    );
}

#[test]
fn function_params_keep_argument_order() {
    let c = FunctionParamsCanonicalizer::new();

    let a: FunctionParams = serde_json::from_value(json!({ "x": 1, "y": 2 })).unwrap();
    let b: FunctionParams = serde_json::from_value(json!({ "y": 2, "x": 1 })).unwrap();

    assert_ne!(c.canonicalize(&a).unwrap(), c.canonicalize(&b).unwrap());
    assert_eq!(c.canonicalize(&a).unwrap(), c.canonicalize(&a.clone()).unwrap());
}

// -- Object set operations --

#[test]
fn object_set_operations_normalize_nested_parts() {
    let c = ObjectSetOperationsCanonicalizer::new();

    let a: ObjectSetOperations = serde_json::from_value(json!({
        "where": { "$and": [{ "status": { "$eq": "OPEN" } }] },
        "withProperties": { "b": 2, "a": 1 },
        "union": ["s2", "s1", "s2"],
    }))
    .unwrap();
    let b: ObjectSetOperations = serde_json::from_value(json!({
        "withProperties": { "a": 1, "b": 2 },
        "where": { "status": "OPEN" },
        "union": ["s1", "s2"],
        "intersect": [],
    }))
    .unwrap();

    let ca = c.canonicalize(&a).unwrap();
    let cb = c.canonicalize(&b).unwrap();

    assert_eq!(ca, cb);
    assert_eq!(
        serde_json::to_value(&*ca).unwrap(),
        json!({
            "withProperties": { "a": 1, "b": 2 },
            "where": { "status": "OPEN" },
            "union": ["s1", "s2"],
        })
    );
}

#[test]
fn empty_object_set_operations_collide() {
    let c = ObjectSetOperationsCanonicalizer::new();

    let bare = c.canonicalize(&ObjectSetOperations::default()).unwrap();
    let empties: ObjectSetOperations = serde_json::from_value(json!({
        "where": { "$and": [] },
        "withProperties": {},
        "subtract": [],
    }))
    .unwrap();

    assert_eq!(bare, c.canonicalize(&empties).unwrap());
    assert_eq!(serde_json::to_value(&*bare).unwrap(), json!({}));
}

#[test]
fn set_operation_kinds_are_distinct() {
    let c = ObjectSetOperationsCanonicalizer::new();

    let union: ObjectSetOperations =
        serde_json::from_value(json!({ "union": ["s1"] })).unwrap();
    let subtract: ObjectSetOperations =
        serde_json::from_value(json!({ "subtract": ["s1"] })).unwrap();

    assert_ne!(c.canonicalize(&union).unwrap(), c.canonicalize(&subtract).unwrap());
}

#[test]
fn type_kind_names() {
    assert_eq!(TypeKind::Object.as_str(), "object");
    assert_eq!(TypeKind::Interface.as_str(), "interface");
    assert_eq!(serde_json::to_value(TypeKind::Interface).unwrap(), json!("interface"));
}
