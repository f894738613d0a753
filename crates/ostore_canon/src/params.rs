//! Query parameters that take part in cache keys, and their canonicalizers.
//!
//! Each parameter kind keeps its own concrete type through `Canonical<T>`.
//! Where a kind has an obvious normal form it is applied before keying:
//!
//! | parameter | normalization |
//! |---|---|
//! | [`OrderBy`] | unset directions dropped, property order kept |
//! | [`DerivedProperties`] | entries sorted by name |
//! | [`AggregateOptions`] | empty `$groupBy` becomes absent |
//! | [`ObjectSetOperations`] | nested where clause normalized, set lists sorted |
//! | [`PivotInfo`], [`FunctionParams`] | none |

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonicalizer::{Canonicalize, ValueCanonicalizer};
use crate::{CanonError, Canonical, WhereClause};

/// Whether an API name refers to an object type or an interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Object,
    Interface,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Property to sort direction, highest priority first. `None` entries are
/// placeholders and do not affect the ordering.
pub type OrderBy = IndexMap<String, Option<SortDirection>>;

/// Runtime derived properties: property name to definition.
pub type DerivedProperties = IndexMap<String, Value>;

/// Named arguments of a function query.
pub type FunctionParams = IndexMap<String, Value>;

/// Link traversal applied to a list query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotInfo {
    pub source_type: String,
    pub source_kind: TypeKind,
    pub link_name: String,
}

/// Aggregate selection and grouping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateOptions {
    #[serde(rename = "$select")]
    pub select: IndexMap<String, Value>,
    #[serde(rename = "$groupBy", default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<IndexMap<String, Value>>,
}

/// Operations layered on top of a base object set.
///
/// Set operands are wire object-set definitions serialized to strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSetOperations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_properties: Option<DerivedProperties>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub union: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intersect: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtract: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot_to: Option<String>,
}

/// Orderings. Keeps priority order, drops unset entries.
#[derive(Default)]
pub struct OrderByCanonicalizer {
    inner: ValueCanonicalizer<OrderBy>,
}

impl OrderByCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical "no ordering".
    pub fn empty(&self) -> Result<Canonical<OrderBy>, CanonError> {
        self.inner.canonicalize(&OrderBy::new())
    }
}

impl Canonicalize for OrderByCanonicalizer {
    type Value = OrderBy;

    fn canonicalize(&self, value: &OrderBy) -> Result<Canonical<OrderBy>, CanonError> {
        let set: OrderBy = value
            .iter()
            .filter(|(_, direction)| direction.is_some())
            .map(|(property, direction)| (property.clone(), *direction))
            .collect();
        self.inner.canonicalize(&set)
    }
}

/// Derived-property configurations. Entry order carries no meaning.
#[derive(Default)]
pub struct RdpCanonicalizer {
    inner: ValueCanonicalizer<DerivedProperties>,
}

impl RdpCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Canonicalize for RdpCanonicalizer {
    type Value = DerivedProperties;

    fn canonicalize(
        &self,
        value: &DerivedProperties,
    ) -> Result<Canonical<DerivedProperties>, CanonError> {
        self.inner.canonicalize(&sorted_by_name(value))
    }
}

pub type PivotCanonicalizer = ValueCanonicalizer<PivotInfo>;

/// Function arguments are keyed exactly as given.
pub type FunctionParamsCanonicalizer = ValueCanonicalizer<FunctionParams>;

/// Aggregate options. An empty grouping is the same as no grouping.
#[derive(Default)]
pub struct AggregateCanonicalizer {
    inner: ValueCanonicalizer<AggregateOptions>,
}

impl AggregateCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Canonicalize for AggregateCanonicalizer {
    type Value = AggregateOptions;

    fn canonicalize(
        &self,
        value: &AggregateOptions,
    ) -> Result<Canonical<AggregateOptions>, CanonError> {
        let normalized = AggregateOptions {
            select: value.select.clone(),
            group_by: value.group_by.clone().filter(|g| !g.is_empty()),
        };
        self.inner.canonicalize(&normalized)
    }
}

/// Object-set operations.
#[derive(Default)]
pub struct ObjectSetOperationsCanonicalizer {
    inner: ValueCanonicalizer<ObjectSetOperations>,
}

impl ObjectSetOperationsCanonicalizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Canonicalize for ObjectSetOperationsCanonicalizer {
    type Value = ObjectSetOperations;

    fn canonicalize(
        &self,
        value: &ObjectSetOperations,
    ) -> Result<Canonical<ObjectSetOperations>, CanonError> {
        let where_clause = match &value.where_clause {
            Some(clause) => Some(clause.normalize()?).filter(|c| !c.is_empty()),
            None => None,
        };
        let with_properties = value
            .with_properties
            .as_ref()
            .filter(|p| !p.is_empty())
            .map(sorted_by_name);

        let normalized = ObjectSetOperations {
            with_properties,
            where_clause,
            union: sorted_set(&value.union),
            intersect: sorted_set(&value.intersect),
            subtract: sorted_set(&value.subtract),
            pivot_to: value.pivot_to.clone(),
        };
        self.inner.canonicalize(&normalized)
    }
}

fn sorted_by_name(properties: &DerivedProperties) -> DerivedProperties {
    let mut sorted = properties.clone();
    sorted.sort_keys();
    sorted
}

/// Sorted, deduplicated copy of a list of set operands.
fn sorted_set(items: &[String]) -> Vec<String> {
    let mut out = items.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
mod tests;
