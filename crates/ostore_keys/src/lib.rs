//! Ostore cache keys.
//!
//! - [`KeyBuilder`] assembles a [`CacheKey`] from canonicalized query parameters
//! - [`CacheKeys`] interns keys into shared [`KnownCacheKey`] handles
//! - [`ObjectCacheKeyRegistry`] groups object keys by object
//! - [`RefCounts`] decides when an unused key may be cleaned up

mod builder;
mod cache_key;
mod object_registry;
mod ref_counts;
mod registry;

pub use builder::{AggregationQuery, KeyBuilder, LinkQuery, ListQuery};
pub use cache_key::{
    AggregationKey, CacheKey, FunctionKey, KeyKind, KeySegment, KeySegments, LinkKey, ListKey,
    ObjectKey, ObjectSetKey, PrimaryKey,
};
pub use object_registry::ObjectCacheKeyRegistry;
pub use ref_counts::RefCounts;
pub use registry::{CacheKeys, KnownCacheKey};
