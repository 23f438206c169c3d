// Distributed under the MIT software license

//! Nostr-native Git collaboration engine.
//!
//! This crate is the thin façade over the workspace's capability crates —
//! event codec ([`nostr`]), filesystem/object-store abstraction
//! ([`nostr_git_objects`]), repo cache ([`nostr_git_cache`]), vendor API
//! adapters ([`nostr_git_vendor`]), event transport/reconciliation/stack/
//! label/thread logic ([`nostr_git_core`]), the clone ladder
//! ([`nostr_git_clone`]) and merge analysis/patch application/safe push
//! ([`nostr_git_merge`]) — mirroring how the teacher workspace's
//! `nostr-sdk` sits over `nostr`/`nostr-relay-pool`/`nostr-database`.
//!
//! Most callers want [`prelude`] and [`RepoEngine`].

pub mod config;
pub mod engine;
pub mod error;
pub mod prelude;

pub use config::EngineConfig;
pub use engine::RepoEngine;
pub use error::{Error, ErrorKind};
