//! Cache key model.
//!
//! Every cached query result is indexed by a [`CacheKey`]. Each variant has a
//! fixed positional schema; the struct field order is that schema and
//! [`CacheKey::segments`] flattens it into a path for interning:
//!
//! | kind | positions |
//! |---|---|
//! | object | `[object, api_name, primary_key, rdp?]` |
//! | list | `[list, type_kind, api_name, where, order_by, rdp?, intersect_with?, pivot?, rids?]` |
//! | objectSet | `[objectSet, base_object_set, operations, rdp?]` |
//! | aggregation | `[aggregation, type_kind, api_name, object_set?, where, rdp?, intersect_with?, aggregate]` |
//! | link | `[link, source_api_name, source_kind, source_object_type?, source_pk, link_name, where, order_by]` |
//! | function | `[function, api_name, version?, params?]` |
//!
//! Reordering positions changes which requests collide.
//!
//! Canonical parts are compared by identity, so two keys are equal iff
//! every position is equal after canonicalization.

use std::fmt;

use ostore_canon::{
    AggregateOptions, Canonical, CanonicalId, DerivedProperties, FunctionParams, IntersectWith,
    ObjectSetOperations, OrderBy, PivotInfo, StructuralKey, TypeKind, WhereClause,
};
use smallvec::{smallvec, SmallVec};

/// Query kind. Always the first position of a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyKind {
    Object,
    List,
    ObjectSet,
    Aggregation,
    Link,
    Function,
}

impl KeyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Object => "object",
            KeyKind::List => "list",
            KeyKind::ObjectSet => "objectSet",
            KeyKind::Aggregation => "aggregation",
            KeyKind::Link => "link",
            KeyKind::Function => "function",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary key value of an object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    Str(String),
    Int(i64),
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::Str(value.to_owned())
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        PrimaryKey::Str(value)
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        PrimaryKey::Int(value)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Str(s) => f.write_str(s),
            PrimaryKey::Int(i) => write!(f, "{i}"),
        }
    }
}

/// One position of a flattened cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeySegment {
    Kind(KeyKind),
    TypeKind(TypeKind),
    Str(String),
    PrimaryKey(PrimaryKey),
    /// A canonical part, by identity.
    Canonical(CanonicalId),
    /// An optional position that was not given.
    Absent,
}

impl KeySegment {
    fn canonical<T>(value: &Canonical<T>) -> Self {
        KeySegment::Canonical(value.id())
    }

    fn opt_canonical<T>(value: Option<&Canonical<T>>) -> Self {
        value.map_or(KeySegment::Absent, KeySegment::canonical)
    }

    fn opt_str(value: Option<&str>) -> Self {
        value.map_or(KeySegment::Absent, |s| KeySegment::Str(s.to_owned()))
    }
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySegment::Kind(kind) => f.write_str(kind.as_str()),
            KeySegment::TypeKind(kind) => f.write_str(kind.as_str()),
            KeySegment::Str(s) => f.write_str(s),
            KeySegment::PrimaryKey(pk) => write!(f, "{pk}"),
            KeySegment::Canonical(id) => write!(f, "{id}"),
            KeySegment::Absent => f.write_str("-"),
        }
    }
}

/// Flattened key path. Nine positions cover the widest schema.
pub type KeySegments = SmallVec<[KeySegment; 9]>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub api_name: String,
    pub primary_key: PrimaryKey,
    pub rdp: Option<Canonical<DerivedProperties>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListKey {
    pub type_kind: TypeKind,
    pub api_name: String,
    pub where_clause: Canonical<WhereClause>,
    pub order_by: Canonical<OrderBy>,
    pub rdp: Option<Canonical<DerivedProperties>>,
    pub intersect_with: Option<IntersectWith>,
    pub pivot: Option<Canonical<PivotInfo>>,
    pub rids: Option<Canonical<Vec<String>>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectSetKey {
    /// Structural key of the wire object-set definition.
    pub base_object_set: StructuralKey,
    pub operations: Canonical<ObjectSetOperations>,
    pub rdp: Option<Canonical<DerivedProperties>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub type_kind: TypeKind,
    pub api_name: String,
    pub object_set: Option<StructuralKey>,
    pub where_clause: Canonical<WhereClause>,
    pub rdp: Option<Canonical<DerivedProperties>>,
    pub intersect_with: Option<IntersectWith>,
    pub aggregate: Canonical<AggregateOptions>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub source_api_name: String,
    pub source_kind: TypeKind,
    /// Concrete object type when the source is an interface.
    pub source_object_type: Option<String>,
    pub source_pk: PrimaryKey,
    pub link_name: String,
    pub where_clause: Canonical<WhereClause>,
    pub order_by: Canonical<OrderBy>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    pub api_name: String,
    pub version: Option<String>,
    pub params: Option<Canonical<FunctionParams>>,
}

/// Key of one cached query result.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Object(ObjectKey),
    List(ListKey),
    ObjectSet(ObjectSetKey),
    Aggregation(AggregationKey),
    Link(LinkKey),
    Function(FunctionKey),
}

impl CacheKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            CacheKey::Object(_) => KeyKind::Object,
            CacheKey::List(_) => KeyKind::List,
            CacheKey::ObjectSet(_) => KeyKind::ObjectSet,
            CacheKey::Aggregation(_) => KeyKind::Aggregation,
            CacheKey::Link(_) => KeyKind::Link,
            CacheKey::Function(_) => KeyKind::Function,
        }
    }

    /// The positional schema of this key as a path.
    pub fn segments(&self) -> KeySegments {
        let kind = KeySegment::Kind(self.kind());
        match self {
            CacheKey::Object(k) => smallvec![
                kind,
                KeySegment::Str(k.api_name.clone()),
                KeySegment::PrimaryKey(k.primary_key.clone()),
                KeySegment::opt_canonical(k.rdp.as_ref()),
            ],
            CacheKey::List(k) => smallvec![
                kind,
                KeySegment::TypeKind(k.type_kind),
                KeySegment::Str(k.api_name.clone()),
                KeySegment::canonical(&k.where_clause),
                KeySegment::canonical(&k.order_by),
                KeySegment::opt_canonical(k.rdp.as_ref()),
                KeySegment::opt_canonical(k.intersect_with.as_ref()),
                KeySegment::opt_canonical(k.pivot.as_ref()),
                KeySegment::opt_canonical(k.rids.as_ref()),
            ],
            CacheKey::ObjectSet(k) => smallvec![
                kind,
                KeySegment::Str(k.base_object_set.as_str().to_owned()),
                KeySegment::canonical(&k.operations),
                KeySegment::opt_canonical(k.rdp.as_ref()),
            ],
            CacheKey::Aggregation(k) => smallvec![
                kind,
                KeySegment::TypeKind(k.type_kind),
                KeySegment::Str(k.api_name.clone()),
                KeySegment::opt_str(k.object_set.as_ref().map(StructuralKey::as_str)),
                KeySegment::canonical(&k.where_clause),
                KeySegment::opt_canonical(k.rdp.as_ref()),
                KeySegment::opt_canonical(k.intersect_with.as_ref()),
                KeySegment::canonical(&k.aggregate),
            ],
            CacheKey::Link(k) => smallvec![
                kind,
                KeySegment::Str(k.source_api_name.clone()),
                KeySegment::TypeKind(k.source_kind),
                KeySegment::opt_str(k.source_object_type.as_deref()),
                KeySegment::PrimaryKey(k.source_pk.clone()),
                KeySegment::Str(k.link_name.clone()),
                KeySegment::canonical(&k.where_clause),
                KeySegment::canonical(&k.order_by),
            ],
            CacheKey::Function(k) => smallvec![
                kind,
                KeySegment::Str(k.api_name.clone()),
                KeySegment::opt_str(k.version.as_deref()),
                KeySegment::opt_canonical(k.params.as_ref()),
            ],
        }
    }

    pub fn as_object(&self) -> Option<&ObjectKey> {
        match self {
            CacheKey::Object(k) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
