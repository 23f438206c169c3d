// Distributed under the MIT software license

//! Signed-event primitives for the nostr-git federation engine.
//!
//! This crate is the Event Codec (§4.A): event/id/kind/tag types, the
//! signing capability, and the NIP-34 git-collaboration event family.
//! Everything above it — reconciliation, caching, merge analysis — lives
//! in the `nostr-git-*` crates.

pub mod event;
pub mod key;
pub mod nips;
pub mod types;

pub use event::{Event, EventBuilder, EventId, Kind, Tag, TagListExt};
pub use key::{Keys, PublicKey, SecretKey, Signer, SignerError};
pub use types::{Clock, Filter, SystemClock, Timestamp};
