// Distributed under the MIT software license

//! Event transport, repo-state reconciliation, and the stack/label/thread
//! metadata layered on top of the raw event codec (`nostr`).
//!
//! - [`transport`] — §4.B `EventIO`, the signed-event fetch/publish capability.
//! - [`reconcile`] — §4.C maintainer-bounded, latest-writer-wins ref reconciliation.
//! - [`stack`] — §4.L stack descriptors and the patch-revision `supersedes` DAG.
//! - [`labels`] — §4.M self- and externally-applied label resolution.
//! - [`threads`] — §4.N comment/status threading and final-status selection.

pub mod labels;
pub mod reconcile;
pub mod stack;
pub mod threads;
pub mod transport;

pub use labels::resolve_labels;
pub use reconcile::{group_by_euc, maintainer_set, reconcile_ref_map, EucGroup, RefMap, RefRecord};
pub use stack::{PatchNode, StackDescriptor, StackError, StackManager};
pub use threads::{assemble_thread, final_item_status, final_status, Thread};
pub use transport::{dedup_by_id, EventIO, MemoryEventIO, PublishOutcome, TransportError};
