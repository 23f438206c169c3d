// Distributed under the MIT software license

//! One-line import for everything a typical caller needs, mirroring the
//! teacher's `nostr_sdk::prelude`.

pub use nostr::nips::nip01::Coordinate;
pub use nostr::nips::nip34::{ExternalLabel, GitIssue, GitPatch, GitStack, RepoAnnouncement, RepoState};
pub use nostr::{Event, EventBuilder, EventId, Filter, Keys, Kind, PublicKey, Tag, Timestamp};

pub use nostr_git_cache::{CacheMode, CacheStore, CachedRef, DataLevel, MemoryCacheStore, RepoCache, RepoCacheRecord};
pub use nostr_git_clone::{CloneLadder, LadderError, PreferredUrlMap};
pub use nostr_git_core::{
    assemble_thread, final_item_status, final_status, group_by_euc, maintainer_set, reconcile_ref_map, resolve_labels,
    EucGroup, EventIO, MemoryEventIO, PatchNode, RefMap, RefRecord, StackDescriptor, StackManager, Thread,
};
pub use nostr_git_merge::{
    safe_push_preflight, AnalysisKind, ApplyOutcome, MergeAnalysisResult, MergeAnalyzer, MergeError, PatchApplier,
    PatchCommitInfo, PatchInput, PreflightOptions, PreflightReason, PreflightResult,
};
pub use nostr_git_objects::{Fs, MemoryFs, MemoryObjectStore, ObjectStore};
pub use nostr_git_vendor::{
    BitbucketAdapter, GitHubAdapter, GitLabAdapter, GiteaAdapter, GitServiceApi, NativeRelayAdapter, VendorError,
};

pub use crate::config::EngineConfig;
pub use crate::engine::RepoEngine;
pub use crate::error::{Error, ErrorKind};
