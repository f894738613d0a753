//! Ostore: an observable object-graph cache.
//!
//! Query results are stored under interned cache keys built from canonicalized
//! query parameters, so two requests that mean the same thing read and write
//! the same entry.
//!
//! ```text
//! let mut store = Store::<Value>::new();
//! let key = store.key_builder().list(&ListQuery::new(TypeKind::Object, "Employee"))?;
//! let key = store.cache_key(key);
//! store.retain(&key);
//! store.batch(None, |ctx| ctx.write(&key, Some(rows), Status::Loaded));
//! ```
//!
//! The canonicalization core lives in `ostore_canon`, key construction in
//! `ostore_keys`; both are re-exported here.

mod config;
mod entry;
mod layer;
mod store;
mod subscribers;
mod tracing_setup;

pub use config::{StoreConfig, DEFAULT_KEEP_ALIVE};
pub use entry::{Entry, Status};
pub use layer::OptimisticId;
pub use store::{BatchContext, Store};
pub use subscribers::{Callback, SubjectPayload, SubscriptionId};
pub use tracing_setup::init_tracing;

pub use ostore_canon as canon;
pub use ostore_keys as keys;
