//! Typed cache-key constructors.
//!
//! [`KeyBuilder`] turns the defining parameters of a query into a
//! [`CacheKey`]. Every structurally-variable parameter goes through the
//! matching canonicalizer first, so requests that mean the same thing produce
//! equal keys no matter how their parameters were assembled.
//!
//! Optional parameters that were not given become absent positions. A missing
//! where clause is the canonical `{}` and a missing ordering is the canonical
//! empty ordering, since both mean "no constraint".

use ostore_canon::{
    structural_key, AggregateOptions, CanonError, Canonical, Canonicalize, Canonicalizers,
    DerivedProperties, FunctionParams, ObjectSetOperations, OrderBy, PivotInfo, TypeKind,
    WhereClause,
};
use serde_json::Value;

use crate::cache_key::{
    AggregationKey, CacheKey, FunctionKey, LinkKey, ListKey, ObjectKey, ObjectSetKey, PrimaryKey,
};

/// Parameters of a list query.
#[derive(Clone, Debug)]
pub struct ListQuery {
    pub type_kind: TypeKind,
    pub api_name: String,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderBy>,
    pub with_properties: Option<DerivedProperties>,
    pub intersect_with: Vec<WhereClause>,
    pub pivot: Option<PivotInfo>,
    pub rids: Option<Vec<String>>,
}

impl ListQuery {
    pub fn new(type_kind: TypeKind, api_name: impl Into<String>) -> Self {
        ListQuery {
            type_kind,
            api_name: api_name.into(),
            where_clause: None,
            order_by: None,
            with_properties: None,
            intersect_with: Vec::new(),
            pivot: None,
            rids: None,
        }
    }
}

/// Parameters of an aggregation.
#[derive(Clone, Debug)]
pub struct AggregationQuery {
    pub type_kind: TypeKind,
    pub api_name: String,
    /// Wire object-set definition to aggregate over, if not the whole type.
    pub object_set: Option<Value>,
    pub where_clause: Option<WhereClause>,
    pub with_properties: Option<DerivedProperties>,
    pub intersect_with: Vec<WhereClause>,
    pub aggregate: AggregateOptions,
}

impl AggregationQuery {
    pub fn new(
        type_kind: TypeKind,
        api_name: impl Into<String>,
        aggregate: AggregateOptions,
    ) -> Self {
        AggregationQuery {
            type_kind,
            api_name: api_name.into(),
            object_set: None,
            where_clause: None,
            with_properties: None,
            intersect_with: Vec::new(),
            aggregate,
        }
    }
}

/// Parameters of a link traversal from one source object.
#[derive(Clone, Debug)]
pub struct LinkQuery {
    pub source_api_name: String,
    pub source_kind: TypeKind,
    pub source_object_type: Option<String>,
    pub source_pk: PrimaryKey,
    pub link_name: String,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderBy>,
}

impl LinkQuery {
    pub fn new(
        source_api_name: impl Into<String>,
        source_pk: impl Into<PrimaryKey>,
        link_name: impl Into<String>,
    ) -> Self {
        LinkQuery {
            source_api_name: source_api_name.into(),
            source_kind: TypeKind::Object,
            source_object_type: None,
            source_pk: source_pk.into(),
            link_name: link_name.into(),
            where_clause: None,
            order_by: None,
        }
    }
}

/// Constructs cache keys against one store's canonicalizers.
#[derive(Copy, Clone)]
pub struct KeyBuilder<'a> {
    canon: &'a Canonicalizers,
}

impl<'a> KeyBuilder<'a> {
    pub fn new(canon: &'a Canonicalizers) -> Self {
        KeyBuilder { canon }
    }

    pub fn object(
        &self,
        api_name: impl Into<String>,
        primary_key: impl Into<PrimaryKey>,
        rdp: Option<&DerivedProperties>,
    ) -> Result<CacheKey, CanonError> {
        Ok(CacheKey::Object(ObjectKey {
            api_name: api_name.into(),
            primary_key: primary_key.into(),
            rdp: self.rdp(rdp)?,
        }))
    }

    #[tracing::instrument(level = "trace", skip_all, fields(api_name = %query.api_name))]
    pub fn list(&self, query: &ListQuery) -> Result<CacheKey, CanonError> {
        Ok(CacheKey::List(ListKey {
            type_kind: query.type_kind,
            api_name: query.api_name.clone(),
            where_clause: self.where_clause(query.where_clause.as_ref())?,
            order_by: self.order_by(query.order_by.as_ref())?,
            rdp: self.rdp(query.with_properties.as_ref())?,
            intersect_with: self.canon.intersect_with(&query.intersect_with)?,
            pivot: self.canon.pivot.canonicalize_opt(query.pivot.as_ref())?,
            rids: self.canon.rids.canonicalize_opt(query.rids.as_ref())?,
        }))
    }

    /// Key for an object set given as a wire definition plus operations.
    ///
    /// Derived properties in `operations` move to the key's own rdp position.
    pub fn object_set(
        &self,
        base_object_set: &Value,
        operations: &ObjectSetOperations,
    ) -> Result<CacheKey, CanonError> {
        let without_rdp = ObjectSetOperations {
            with_properties: None,
            ..operations.clone()
        };
        Ok(CacheKey::ObjectSet(ObjectSetKey {
            base_object_set: structural_key(base_object_set)?,
            operations: self.canon.object_set_operations.canonicalize(&without_rdp)?,
            rdp: self.rdp(operations.with_properties.as_ref())?,
        }))
    }

    #[tracing::instrument(level = "trace", skip_all, fields(api_name = %query.api_name))]
    pub fn aggregation(&self, query: &AggregationQuery) -> Result<CacheKey, CanonError> {
        Ok(CacheKey::Aggregation(AggregationKey {
            type_kind: query.type_kind,
            api_name: query.api_name.clone(),
            object_set: query.object_set.as_ref().map(structural_key).transpose()?,
            where_clause: self.where_clause(query.where_clause.as_ref())?,
            rdp: self.rdp(query.with_properties.as_ref())?,
            intersect_with: self.canon.intersect_with(&query.intersect_with)?,
            aggregate: self.canon.aggregate.canonicalize(&query.aggregate)?,
        }))
    }

    pub fn link(&self, query: &LinkQuery) -> Result<CacheKey, CanonError> {
        Ok(CacheKey::Link(LinkKey {
            source_api_name: query.source_api_name.clone(),
            source_kind: query.source_kind,
            source_object_type: query.source_object_type.clone(),
            source_pk: query.source_pk.clone(),
            link_name: query.link_name.clone(),
            where_clause: self.where_clause(query.where_clause.as_ref())?,
            order_by: self.order_by(query.order_by.as_ref())?,
        }))
    }

    pub fn function(
        &self,
        api_name: impl Into<String>,
        version: Option<&str>,
        params: Option<&FunctionParams>,
    ) -> Result<CacheKey, CanonError> {
        Ok(CacheKey::Function(FunctionKey {
            api_name: api_name.into(),
            version: version.map(str::to_owned),
            params: self.canon.function_params.canonicalize_opt(params)?,
        }))
    }

    fn where_clause(
        &self,
        clause: Option<&WhereClause>,
    ) -> Result<Canonical<WhereClause>, CanonError> {
        match clause {
            Some(clause) => self.canon.where_clause.canonicalize(clause),
            None => self.canon.where_clause.empty(),
        }
    }

    fn order_by(&self, order_by: Option<&OrderBy>) -> Result<Canonical<OrderBy>, CanonError> {
        match order_by {
            Some(order_by) => self.canon.order_by.canonicalize(order_by),
            None => self.canon.order_by.empty(),
        }
    }

    /// Empty derived-property maps mean the same as none.
    fn rdp(
        &self,
        rdp: Option<&DerivedProperties>,
    ) -> Result<Option<Canonical<DerivedProperties>>, CanonError> {
        self.canon
            .rdp
            .canonicalize_opt(rdp.filter(|properties| !properties.is_empty()))
    }
}
