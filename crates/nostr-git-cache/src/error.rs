// Distributed under the MIT software license

use thiserror::Error;

/// Repo cache error.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The underlying key/value backend failed.
    #[error("cache backend error: {0}")]
    Backend(String),
    /// A stored value could not be decoded as the requested record type.
    #[error("corrupt cache entry at key {key}: {source}")]
    Corrupt {
        /// Offending key.
        key: String,
        /// Underlying (de)serialization error.
        #[source]
        source: serde_json::Error,
    },
}
