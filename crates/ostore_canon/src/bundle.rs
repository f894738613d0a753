//! The per-store set of canonicalizers.
//!
//! One `Canonicalizers` is created with each store and lent to everything that
//! builds cache keys. There is no process-wide instance.

use crate::canonicalizer::{Canonicalize, ListCanonicalizer, ValueCanonicalizer};
use crate::key::structural_key;
use crate::params::{
    AggregateCanonicalizer, FunctionParamsCanonicalizer, ObjectSetOperationsCanonicalizer,
    OrderByCanonicalizer, PivotCanonicalizer, RdpCanonicalizer,
};
use crate::{CanonError, Canonical, WhereClause, WhereClauseCanonicalizer};

/// Canonical list of intersection clauses.
pub type IntersectWith = Canonical<Vec<Canonical<WhereClause>>>;

/// One canonicalizer per parameter kind.
#[derive(Default)]
pub struct Canonicalizers {
    pub where_clause: WhereClauseCanonicalizer,
    pub intersect: ListCanonicalizer<WhereClause>,
    pub order_by: OrderByCanonicalizer,
    pub rdp: RdpCanonicalizer,
    pub pivot: PivotCanonicalizer,
    pub aggregate: AggregateCanonicalizer,
    pub object_set_operations: ObjectSetOperationsCanonicalizer,
    pub function_params: FunctionParamsCanonicalizer,
    pub rids: ValueCanonicalizer<Vec<String>>,
}

impl Canonicalizers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize a list of clauses to intersect with.
    ///
    /// Intersection is commutative, so the clauses are normalized, sorted by
    /// structural key and deduplicated. Clauses that match everything are
    /// dropped. `None` when nothing is left.
    pub fn intersect_with(
        &self,
        clauses: &[WhereClause],
    ) -> Result<Option<IntersectWith>, CanonError> {
        let mut keyed = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let canonical = self.where_clause.canonicalize(clause)?;
            if !canonical.is_empty() {
                keyed.push((structural_key(&*canonical)?, canonical));
            }
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.dedup_by(|a, b| a.1 == b.1);

        if keyed.is_empty() {
            return Ok(None);
        }
        let items: Vec<_> = keyed.into_iter().map(|(_, clause)| clause).collect();
        Ok(Some(self.intersect.canonicalize_list(&items)))
    }
}
