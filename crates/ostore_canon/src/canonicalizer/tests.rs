#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::*;

#[test]
fn equal_values_share_one_handle() {
    let c = ValueCanonicalizer::<Value>::new();

    let w1 = json!({ "$eq": { "field": "status", "value": "OPEN" } });
    let w2 = json!({ "$eq": { "field": "status", "value": "OPEN" } });

    let r1 = c.canonicalize(&w1).unwrap();
    let r2 = c.canonicalize(&w2).unwrap();

    assert!(Canonical::ptr_eq(&r1, &r2));
    assert_eq!(*r1, w1);
}

#[test]
fn unequal_values_get_distinct_handles() {
    let c = ValueCanonicalizer::<Value>::new();

    let open = c.canonicalize(&json!({ "status": { "$eq": "OPEN" } })).unwrap();
    let closed = c.canonicalize(&json!({ "status": { "$eq": "CLOSED" } })).unwrap();

    assert_ne!(open, closed);
}

#[test]
fn canonicalize_is_idempotent() {
    let c = ValueCanonicalizer::<Value>::new();

    let first = c.canonicalize(&json!({ "a": [1, 2, { "b": null }] })).unwrap();
    let again = c.canonicalize(&first).unwrap();
    let third = c.canonicalize(&json!({ "a": [1, 2, { "b": null }] })).unwrap();

    assert_eq!(first, again);
    assert_eq!(first, third);
}

#[test]
fn none_passes_through() {
    let c = ValueCanonicalizer::<Value>::new();

    assert_eq!(c.canonicalize_opt(None).unwrap(), None);
    assert_eq!(c.live_count(), 0);

    let some = c.canonicalize_opt(Some(&json!(1))).unwrap();
    assert!(some.is_some());
}

#[test]
fn key_order_is_not_normalized() {
    let c = ValueCanonicalizer::<Value>::new();

    let ab = c.canonicalize(&json!({ "a": 1, "b": 2 })).unwrap();
    let ba = c.canonicalize(&json!({ "b": 2, "a": 1 })).unwrap();

    assert_ne!(ab, ba);
}

#[test]
fn canonical_value_does_not_alias_the_input() {
    let c = ValueCanonicalizer::<Value>::new();

    let mut input = json!({ "region": "exact" });
    let canonical = c.canonicalize(&input).unwrap();
    input["region"] = json!("changed");

    assert_eq!(*canonical, json!({ "region": "exact" }));
    let again = c.canonicalize(&json!({ "region": "exact" })).unwrap();
    assert_eq!(canonical, again);
}

#[test]
fn collected_values_are_rebuilt() {
    let c = ValueCanonicalizer::<Value>::new();

    let first = c.canonicalize(&json!({ "status": "OPEN" })).unwrap();
    assert_eq!(c.live_count(), 1);
    drop(first);
    assert_eq!(c.live_count(), 0);

    let second = c.canonicalize(&json!({ "status": "OPEN" })).unwrap();
    assert_eq!(*second, json!({ "status": "OPEN" }));
    assert_eq!(Canonical::strong_count(&second), 1);
    assert_eq!(c.live_count(), 1);

    let third = c.canonicalize(&json!({ "status": "OPEN" })).unwrap();
    assert_eq!(second, third);
}

#[test]
fn prune_after_collection() {
    let c = ValueCanonicalizer::<Value>::new();

    let keep = c.canonicalize(&json!("keep")).unwrap();
    drop(c.canonicalize(&json!("drop")).unwrap());

    assert_eq!(c.prune(), 1);
    assert_eq!(c.live_count(), 1);
    assert_eq!(*keep, json!("keep"));
}

#[test]
fn typed_values_round_trip() {
    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Paging {
        page_size: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cursor: Option<String>,
    }

    let c = ValueCanonicalizer::<Paging>::new();
    let a = c
        .canonicalize(&Paging {
            page_size: 10,
            cursor: None,
        })
        .unwrap();
    let b = c
        .canonicalize(&Paging {
            page_size: 10,
            cursor: None,
        })
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(
        *a,
        Paging {
            page_size: 10,
            cursor: None
        }
    );
}

#[test]
fn lists_collide_on_element_identity() {
    let values = ValueCanonicalizer::<Value>::new();
    let lists = ListCanonicalizer::<Value>::new();

    let a = values.canonicalize(&json!({ "a": 1 })).unwrap();
    let b = values.canonicalize(&json!({ "b": 2 })).unwrap();

    let l1 = lists.canonicalize_list(&[a.clone(), b.clone()]);
    let l2 = lists
        .canonicalize(&vec![
            values.canonicalize(&json!({ "a": 1 })).unwrap(),
            values.canonicalize(&json!({ "b": 2 })).unwrap(),
        ])
        .unwrap();
    let reversed = lists.canonicalize_list(&[b, a]);

    assert_eq!(l1, l2);
    assert_ne!(l1, reversed);
    assert_eq!(lists.live_count(), 2);
}

#[test]
fn empty_list_is_canonical() {
    let lists = ListCanonicalizer::<Value>::new();

    let a = lists.canonicalize_list(&[]);
    let b = lists.canonicalize_list(&[]);

    assert_eq!(a, b);
    assert!(a.is_empty());
}
