//! Property-based tests for canonicalization.
//!
//! Generates arbitrary JSON values and where clauses and checks:
//! 1. Identity: structurally-equal inputs share one handle
//! 2. Idempotence: canonicalizing a canonical value returns it unchanged
//! 3. Non-collision: different structural keys never share a handle
//! 4. Normal form: normalizing a normalized where clause changes nothing
//! 5. Commutativity: `$and` and `$or` children may come in any order

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use ostore_canon::{
    structural_key, Canonical, Canonicalize, ValueCanonicalizer, WhereClause,
    WhereClauseCanonicalizer,
};
use proptest::prelude::*;
use serde_json::{json, Value};

// -- Strategies --

/// JSON without floats, which do not survive a text round trip bit-exactly.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

fn property_filter_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..3).prop_map(Value::from),
        (0i64..3).prop_map(|v| json!({ "$eq": v })),
        (0i64..3).prop_map(|v| json!({ "$gt": v })),
    ]
}

/// Where clauses over a small property vocabulary, so that merges,
/// conflicts and duplicates actually occur.
fn where_strategy() -> impl Strategy<Value = Value> {
    let properties = prop::collection::vec(
        (prop::sample::select(vec!["a", "b", "c"]), property_filter_strategy()),
        0..3,
    )
    .prop_map(|entries| {
        Value::Object(
            entries
                .into_iter()
                .map(|(name, filter)| (name.to_owned(), filter))
                .collect(),
        )
    });
    properties.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|c| json!({ "$and": c })),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|c| json!({ "$or": c })),
            inner.prop_map(|c| json!({ "$not": c })),
        ]
    })
}

// -- Property Tests --

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn equal_values_share_a_handle(value in json_strategy()) {
        let c = ValueCanonicalizer::<Value>::new();

        let first = c.canonicalize(&value).unwrap();
        let second = c.canonicalize(&value.clone()).unwrap();

        prop_assert!(Canonical::ptr_eq(&first, &second));
        prop_assert_eq!(&*first, &value);
    }

    #[test]
    fn canonicalize_is_idempotent(value in json_strategy()) {
        let c = ValueCanonicalizer::<Value>::new();

        let first = c.canonicalize(&value).unwrap();
        let again = c.canonicalize(&first).unwrap();

        prop_assert_eq!(first, again);
    }

    #[test]
    fn distinct_keys_get_distinct_handles(a in json_strategy(), b in json_strategy()) {
        let c = ValueCanonicalizer::<Value>::new();

        let ca = c.canonicalize(&a).unwrap();
        let cb = c.canonicalize(&b).unwrap();
        let same_key = structural_key(&a).unwrap() == structural_key(&b).unwrap();

        prop_assert_eq!(ca == cb, same_key);
    }

    #[test]
    fn collected_values_are_rebuilt(value in json_strategy()) {
        let c = ValueCanonicalizer::<Value>::new();

        drop(c.canonicalize(&value).unwrap());
        let rebuilt = c.canonicalize(&value).unwrap();

        prop_assert_eq!(&*rebuilt, &value);
        prop_assert_eq!(c.live_count(), 1);
    }

    #[test]
    fn normalization_is_idempotent(value in where_strategy()) {
        let once = WhereClause::from_json(value).unwrap().normalize().unwrap();
        let twice = once.normalize().unwrap();

        prop_assert_eq!(structural_key(&once).unwrap(), structural_key(&twice).unwrap());
    }

    #[test]
    fn canonical_where_clause_is_a_fixed_point(value in where_strategy()) {
        let c = WhereClauseCanonicalizer::new();

        let canonical = c.canonicalize(&WhereClause::from_json(value).unwrap()).unwrap();
        let again = c.canonicalize(&canonical).unwrap();

        prop_assert_eq!(canonical, again);
    }

    #[test]
    fn or_ignores_child_order(
        (children, shuffled) in prop::collection::vec(where_strategy(), 1..5)
            .prop_flat_map(|children| (Just(children.clone()), Just(children).prop_shuffle()))
    ) {
        let c = WhereClauseCanonicalizer::new();

        let a = c.canonicalize(&WhereClause::from_json(json!({ "$or": children })).unwrap()).unwrap();
        let b = c.canonicalize(&WhereClause::from_json(json!({ "$or": shuffled })).unwrap()).unwrap();

        prop_assert_eq!(a, b);
    }

    #[test]
    fn and_ignores_child_order(
        (children, shuffled) in prop::collection::vec(where_strategy(), 1..5)
            .prop_flat_map(|children| (Just(children.clone()), Just(children).prop_shuffle()))
    ) {
        let c = WhereClauseCanonicalizer::new();

        let a = c.canonicalize(&WhereClause::from_json(json!({ "$and": children })).unwrap()).unwrap();
        let b = c.canonicalize(&WhereClause::from_json(json!({ "$and": shuffled })).unwrap()).unwrap();

        prop_assert_eq!(a, b);
    }
}
