//! Where clauses and their normal form.
//!
//! A where clause arrives as JSON in the client's filter shape:
//!
//! ```text
//! { "$and": [ ... ] }   { "$or": [ ... ] }   { "$not": { ... } }
//! { "employeeId": 5, "class": { "$eq": "what" } }
//! ```
//!
//! Before canonicalization every clause is brought into a normal form so that
//! filters which mean the same thing collide even when spelled differently:
//!
//! - `{ "$eq": v }` property filters become the bare value `v`
//! - `$not` of `$not` collapses
//! - `$and` inside `$and` and `$or` inside `$or` are flattened
//! - empty property objects are dropped from `$and`
//! - property names are sorted within each property object
//! - property objects inside one `$and` are merged when none of them
//!   disagree on a property; otherwise all of them stay separate
//! - duplicate children are removed and the rest sorted by structural key
//! - zero children become `{}`, a single child replaces its parent
//!
//! Operator objects inside a filter (`{ "$gt": 1, "$lt": 5 }`) keep their
//! order as given.

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonicalizer::{Canonicalize, ValueCanonicalizer};
use crate::key::{structural_key, StructuralKey};
use crate::{CanonError, Canonical};

/// Property name to filter. A filter is either a bare value (equality) or an
/// operator object such as `{ "$gt": 3 }`.
pub type PropertyFilters = IndexMap<String, Value>;

/// A filter over objects of one type.
#[derive(Clone, Debug, PartialEq)]
pub enum WhereClause {
    And(Vec<WhereClause>),
    Or(Vec<WhereClause>),
    Not(Box<WhereClause>),
    Properties(PropertyFilters),
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Junction {
    And,
    Or,
}

impl Default for WhereClause {
    /// The empty clause `{}`, which matches everything.
    fn default() -> Self {
        WhereClause::Properties(PropertyFilters::new())
    }
}

impl WhereClause {
    /// Parse the JSON filter shape.
    pub fn from_json(value: Value) -> Result<Self, CanonError> {
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(CanonError::invalid_where(format!(
                    "expected an object, found `{other}`"
                )));
            }
        };

        let mut parts = Vec::new();
        let mut properties = PropertyFilters::new();

        for (key, value) in map {
            match key.as_str() {
                "$and" => parts.push(WhereClause::And(parse_list("$and", value)?)),
                "$or" => parts.push(WhereClause::Or(parse_list("$or", value)?)),
                "$not" => parts.push(WhereClause::Not(Box::new(WhereClause::from_json(value)?))),
                op if op.starts_with('$') => {
                    return Err(CanonError::invalid_where(format!(
                        "unknown logical operator `{op}`"
                    )));
                }
                _ => {
                    properties.insert(key, value);
                }
            }
        }

        if parts.is_empty() {
            return Ok(WhereClause::Properties(properties));
        }
        if properties.is_empty() && parts.len() == 1 {
            return Ok(parts.remove(0));
        }
        // Operators mixed with properties are an implicit conjunction.
        if !properties.is_empty() {
            parts.insert(0, WhereClause::Properties(properties));
        }
        Ok(WhereClause::And(parts))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, WhereClause::Properties(p) if p.is_empty())
    }

    /// Bring the clause into normal form.
    pub fn normalize(&self) -> Result<WhereClause, CanonError> {
        ensure_sufficient_stack(|| -> Result<WhereClause, CanonError> {
            match self {
                WhereClause::Properties(filters) => {
                    let mut filters: PropertyFilters = filters
                        .iter()
                        .map(|(name, filter)| (name.clone(), flatten_eq(filter).clone()))
                        .collect();
                    filters.sort_keys();
                    Ok(WhereClause::Properties(filters))
                }
                WhereClause::Not(inner) => match inner.normalize()? {
                    WhereClause::Not(positive) => Ok(*positive),
                    other => Ok(WhereClause::Not(Box::new(other))),
                },
                WhereClause::And(children) => normalize_junction(Junction::And, children),
                WhereClause::Or(children) => normalize_junction(Junction::Or, children),
            }
        })
    }
}

fn parse_list(op: &str, value: Value) -> Result<Vec<WhereClause>, CanonError> {
    let Value::Array(items) = value else {
        return Err(CanonError::invalid_where(format!("`{op}` must be an array")));
    };
    items.into_iter().map(WhereClause::from_json).collect()
}

/// `{ "$eq": v }` means the same as `v`.
fn flatten_eq(mut filter: &Value) -> &Value {
    while let Value::Object(ops) = filter {
        match ops.get("$eq") {
            Some(inner) if ops.len() == 1 => filter = inner,
            _ => break,
        }
    }
    filter
}

fn normalize_junction(
    junction: Junction,
    children: &[WhereClause],
) -> Result<WhereClause, CanonError> {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match (junction, child.normalize()?) {
            (Junction::And, WhereClause::And(nested)) | (Junction::Or, WhereClause::Or(nested)) => {
                flat.extend(nested);
            }
            (Junction::And, clause) if clause.is_empty() => {}
            (_, clause) => flat.push(clause),
        }
    }

    if junction == Junction::And {
        flat = merge_properties(flat);
    }

    let mut keyed = flat
        .into_iter()
        .map(|clause| Ok((structural_key(&clause)?, clause)))
        .collect::<Result<Vec<(StructuralKey, WhereClause)>, CanonError>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.dedup_by(|a, b| a.0 == b.0);

    let mut clauses: Vec<WhereClause> = keyed.into_iter().map(|(_, clause)| clause).collect();
    Ok(match clauses.len() {
        0 => WhereClause::default(),
        1 => clauses.remove(0),
        _ => match junction {
            Junction::And => WhereClause::And(clauses),
            Junction::Or => WhereClause::Or(clauses),
        },
    })
}

/// Merge the property objects of a conjunction into one, sorted by property.
///
/// All or nothing: if two objects filter the same property differently, every
/// object is left as it was.
fn merge_properties(clauses: Vec<WhereClause>) -> Vec<WhereClause> {
    let mut merged = PropertyFilters::new();
    let mut property_count = 0;
    let mut conflict = false;
    for filters in clauses.iter().filter_map(|clause| match clause {
        WhereClause::Properties(filters) => Some(filters),
        _ => None,
    }) {
        property_count += 1;
        for (name, filter) in filters {
            match merged.get(name) {
                Some(existing) => conflict |= existing != filter,
                None => {
                    merged.insert(name.clone(), filter.clone());
                }
            }
        }
    }

    if conflict || property_count < 2 {
        return clauses;
    }

    let mut out: Vec<WhereClause> = clauses
        .into_iter()
        .filter(|clause| !matches!(clause, WhereClause::Properties(_)))
        .collect();
    merged.sort_keys();
    out.push(WhereClause::Properties(merged));
    out
}

impl Serialize for WhereClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WhereClause::Properties(filters) => filters.serialize(serializer),
            WhereClause::And(children) => serialize_operator(serializer, "$and", children),
            WhereClause::Or(children) => serialize_operator(serializer, "$or", children),
            WhereClause::Not(inner) => serialize_operator(serializer, "$not", inner),
        }
    }
}

fn serialize_operator<S: Serializer, V: Serialize + ?Sized>(
    serializer: S,
    op: &str,
    operand: &V,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(op, operand)?;
    map.end()
}

impl<'de> Deserialize<'de> for WhereClause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        WhereClause::from_json(value).map_err(de::Error::custom)
    }
}

/// Canonicalizer that normalizes where clauses before keying them.
#[derive(Default)]
pub struct WhereClauseCanonicalizer {
    inner: ValueCanonicalizer<WhereClause>,
}

impl WhereClauseCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical `{}`.
    pub fn empty(&self) -> Result<Canonical<WhereClause>, CanonError> {
        self.inner.canonicalize(&WhereClause::default())
    }

    pub fn live_count(&self) -> usize {
        self.inner.live_count()
    }
}

impl Canonicalize for WhereClauseCanonicalizer {
    type Value = WhereClause;

    #[tracing::instrument(level = "trace", skip_all)]
    fn canonicalize(&self, value: &WhereClause) -> Result<Canonical<WhereClause>, CanonError> {
        self.inner.canonicalize(&value.normalize()?)
    }
}

/// Minimum stack space to keep available while recursing into nested clauses.
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 64 * 1024;

/// Stack space to allocate when growing.
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
