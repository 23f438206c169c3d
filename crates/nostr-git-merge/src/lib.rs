// Distributed under the MIT software license

//! Dry-run merge analysis, unified-diff patch application, and the
//! safe-push preflight gate (§4.I, §4.J, §4.K).
//!
//! Operates purely on an already-materialized working tree via
//! [`nostr_git_objects::ObjectStore`]; bringing a repo up to that point
//! (the clone ladder and its mirror fallback) is a different crate's job.

mod analyzer;
mod apply;
mod diff;
mod error;
mod safe_push;

pub use analyzer::{
    AnalysisKind, ConflictDetail, ConflictFileKind, ConflictMarker, ConflictMarkerKind, MergeAnalysisResult, MergeAnalyzer,
    PatchInput,
};
pub use apply::{ApplyOutcome, PatchApplier, PatchCommitInfo, PushDiagnostic};
pub use diff::{apply_hunks, parse_unified_diff, DiffError, FileDiff, FileDiffKind, Hunk, UnsupportedKind};
pub use error::MergeError;
pub use safe_push::{
    needs_update, safe_push_preflight, PreflightOptions, PreflightReason, PreflightResult, RemoteHeadProbe,
    NATIVE_RELAY_PROVIDER,
};
