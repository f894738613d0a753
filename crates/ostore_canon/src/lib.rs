//! Ostore canonicalization core.
//!
//! Turns structurally-equal query parameters into one shared handle so that
//! cache keys built from them can be compared by identity:
//!
//! - [`structural_key`] serializes a value into its exact JSON key
//! - [`WeakRefTrie`] stores canonical values without keeping them alive
//! - [`Canonicalize`] maps a value to its [`Canonical`] handle
//! - [`Canonicalizers`] bundles one canonicalizer per query parameter kind
//!
//! # Lifetime
//!
//! Canonical values live exactly as long as some caller holds a handle. Once
//! the last handle is dropped, the next lookup of the same structure builds a
//! fresh value from its key.

mod bundle;
mod canonical;
mod canonicalizer;
mod error;
mod key;
pub mod params;
mod trie;
mod where_clause;

pub use bundle::{Canonicalizers, IntersectWith};
pub use canonical::{Canonical, CanonicalId};
pub use canonicalizer::{Canonicalize, ListCanonicalizer, ValueCanonicalizer};
pub use error::CanonError;
pub use key::{structural_key, StructuralKey};
pub use params::{
    AggregateOptions, DerivedProperties, FunctionParams, ObjectSetOperations, OrderBy, PivotInfo,
    SortDirection, TypeKind,
};
pub use trie::WeakRefTrie;
pub use where_clause::{PropertyFilters, WhereClause, WhereClauseCanonicalizer};
