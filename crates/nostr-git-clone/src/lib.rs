// Distributed under the MIT software license

//! URL fallback, the clone-ladder state machine, and reference rescue —
//! the network-facing half of cloning a repo onto local disk.
//!
//! - [`fallback`] — §4.E ordered mirror-URL racing with CORS-aware retry.
//! - [`ladder`] — §4.G the `none → refs → shallow → full` state machine.
//! - [`rescue`] — §4.H recovering a lost local branch after a shallow clone.

pub mod fallback;
pub mod ladder;
pub mod rescue;

pub use fallback::{
    is_recoverable_message, with_url_fallback, Attempt, FallbackOutcome, PreferredUrlMap,
    CATASTROPHIC_TIMEOUT, DEFAULT_CLONE_TIMEOUT, DEFAULT_FETCH_TIMEOUT,
};
pub use ladder::{canonical_repo_dir, CloneLadder, LadderError};
pub use rescue::{pick_default_branch, rescue_references, RescueOptions, COMMON_DEFAULT_BRANCHES};
