// Distributed under the MIT software license

//! Top-level error, unifying every sub-crate's error behind the §7
//! error-kind taxonomy, in the style of `nostr-relay-pool::pool::Error`
//! wrapping `relay::Error`/`DatabaseError`/... with `#[from]`.

use nostr_git_cache::CacheError;
use nostr_git_clone::LadderError;
use nostr_git_core::{StackError, TransportError};
use nostr_git_merge::MergeError;
use nostr_git_objects::{FsError, ObjectStoreError};
use nostr_git_vendor::VendorError;
use thiserror::Error;

/// §7 error-kind taxonomy, independent of which crate raised the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed argument.
    InvalidInput,
    /// Event failed schema validation.
    InvalidEvent,
    /// No branch resolvable for the requested refspec.
    InvalidRefspec,
    /// Repo/ref/file absent.
    NotFound,
    /// Operation exceeded its budget.
    Timeout,
    /// CORS/Access-Control/no-refspec class; the caller should proceed
    /// with local state rather than treat this as fatal.
    NetworkRecoverable,
    /// Feature not offered by this adapter.
    NotSupported,
    /// Remote refused (pre-receive/protected).
    Rejected,
    /// Merge conflict detected.
    Conflict,
    /// Unexpected.
    Internal,
}

/// Engine-level error. Every variant maps to one [`ErrorKind`] via
/// [`Error::kind`], so callers can branch on the taxonomy without
/// matching every sub-crate's concrete type.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem capability failure.
    #[error(transparent)]
    Fs(#[from] FsError),
    /// Object-store capability failure.
    #[error(transparent)]
    Object(#[from] ObjectStoreError),
    /// Repo cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Clone-ladder failure.
    #[error(transparent)]
    Ladder(#[from] LadderError),
    /// Merge analysis / patch application / safe-push failure.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// Vendor API adapter failure.
    #[error(transparent)]
    Vendor(#[from] VendorError),
    /// Stack/supersedes-DAG failure.
    #[error(transparent)]
    Stack(#[from] StackError),
    /// Event transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Caller-supplied argument was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// The §7 error kind this error belongs to, for callers that branch
    /// on category rather than concrete sub-crate type.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Fs(FsError::NotFound(_)) => ErrorKind::NotFound,
            Error::Fs(FsError::Io { .. }) => ErrorKind::Internal,
            Error::Object(e) => object_kind(e),
            Error::Cache(_) => ErrorKind::Internal,
            Error::Ladder(LadderError::AllUrlsFailed { .. }) => ErrorKind::NetworkRecoverable,
            Error::Ladder(LadderError::Cache(_)) => ErrorKind::Internal,
            Error::Ladder(LadderError::Object(e)) => object_kind(e),
            Error::Merge(e) => merge_kind(e),
            Error::Vendor(e) => vendor_kind(e),
            Error::Stack(StackError::Cycle(_)) => ErrorKind::InvalidInput,
            Error::Transport(TransportError::PublishRejected(_)) => ErrorKind::Rejected,
            Error::Transport(TransportError::Unreachable(_)) => ErrorKind::NetworkRecoverable,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}

fn object_kind(e: &ObjectStoreError) -> ErrorKind {
    match e {
        ObjectStoreError::NoRepository(_)
        | ObjectStoreError::UnknownRef(_)
        | ObjectStoreError::UnknownRemote(_)
        | ObjectStoreError::UnknownObject(_) => ErrorKind::NotFound,
        ObjectStoreError::PushRejected(_) => ErrorKind::Rejected,
        ObjectStoreError::Transport { .. } => ErrorKind::NetworkRecoverable,
        ObjectStoreError::Backend(_) => ErrorKind::Internal,
    }
}

fn merge_kind(e: &MergeError) -> ErrorKind {
    match e {
        MergeError::Diff(_) => ErrorKind::InvalidInput,
        MergeError::Object { source, .. } => object_kind(source),
        MergeError::InvalidRefspec { .. } => ErrorKind::InvalidRefspec,
        // No hunk touched the tree; closest existing kind is "this input
        // didn't describe a real change", not a conflict.
        MergeError::NoChangesToApply(_) => ErrorKind::InvalidInput,
        MergeError::Rejected { .. } => ErrorKind::Rejected,
        MergeError::NotCloned(_) => ErrorKind::NotFound,
    }
}

fn vendor_kind(e: &VendorError) -> ErrorKind {
    match e {
        VendorError::Http { status, .. } if *status == 404 => ErrorKind::NotFound,
        VendorError::Http { .. } => ErrorKind::Internal,
        VendorError::Transport { .. } => ErrorKind::NetworkRecoverable,
        VendorError::Decode { .. } => ErrorKind::Internal,
        VendorError::NotSupported { .. } => ErrorKind::NotSupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn not_cloned_maps_to_not_found() {
        let err = Error::Merge(MergeError::NotCloned(PathBuf::from("/x")));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn protected_rejection_maps_to_rejected() {
        let err = Error::Merge(MergeError::Rejected { remote: "origin".into(), reason: "protected".into() });
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn vendor_not_supported_maps_through() {
        let err = Error::Vendor(VendorError::NotSupported { vendor: "native-relay", operation: "listIssues" });
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn cycle_maps_to_invalid_input() {
        let id = nostr::EventId::from_bytes([7u8; 32]);
        let err = Error::Stack(StackError::Cycle(id));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
