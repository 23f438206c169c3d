// Distributed under the MIT software license

use thiserror::Error;

/// Event-level error (§7 `InvalidEvent`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Serialization/deserialization failure.
    #[error("json error: {0}")]
    Json(String),
    /// Malformed event id.
    #[error(transparent)]
    Id(#[from] super::id::Error),
    /// Malformed public key.
    #[error(transparent)]
    Key(#[from] crate::key::Error),
    /// Malformed tag.
    #[error(transparent)]
    Tag(#[from] super::tag::Error),
    /// Computed id doesn't match the `id` field.
    #[error("event id mismatch")]
    IdMismatch,
    /// Signature does not verify.
    #[error("invalid signature")]
    InvalidSignature,
    /// A mandatory identity tag (`d` for addressable kinds, `a` for
    /// patch/issue/PR/status kinds) is missing (§4.A).
    #[error("missing mandatory tag: {0}")]
    MissingMandatoryTag(&'static str),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mandatory_tag_renders_its_name() {
        let err = Error::MissingMandatoryTag("d");
        assert_eq!(err.to_string(), "missing mandatory tag: d");
    }

    #[test]
    fn json_error_wraps_the_underlying_message() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
