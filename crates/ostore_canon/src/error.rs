//! Canonicalization errors.
//!
//! Every variant describes a contract violation by the caller (a value that
//! cannot be keyed, or a type whose `Serialize` and `Deserialize` disagree).
//! None of them are retried; they propagate to whoever asked for the key.

/// Error produced while building a structural key or canonicalizing a value.
#[derive(Debug, thiserror::Error)]
pub enum CanonError {
    /// The value could not be serialized into a structural key.
    #[error("cannot build structural key for `{type_name}`: {source}")]
    Serialization {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A structural key could not be turned back into the value it was built from.
    #[error("structural key does not round-trip into `{type_name}`: {source}")]
    Reconstruction {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// JSON input that does not describe a where clause.
    #[error("invalid where clause: {reason}")]
    InvalidWhereClause { reason: String },
}

impl CanonError {
    pub(crate) fn invalid_where(reason: impl Into<String>) -> Self {
        CanonError::InvalidWhereClause {
            reason: reason.into(),
        }
    }
}
