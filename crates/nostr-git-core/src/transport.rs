// Distributed under the MIT software license

//! `EventIO` (§4.B): the signed-event transport capability.
//!
//! A pure capability, no policy: fetch events matching a set of filters,
//! publish a signed event, report per-relay outcomes. Ordering across
//! relays is not guaranteed — callers deduplicate by `id` (see
//! [`dedup_by_id`]). Grounded in the teacher's split between
//! `nostr-relay-pool`'s `RelayPool` (policy: reconnection, backoff,
//! negentropy) and the raw relay socket it drives — this trait is the
//! latter's shape, kept deliberately free of the former's policy.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use nostr::{Event, EventId, Filter};
use thiserror::Error;

/// Transport-level error.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No relay accepted the publish.
    #[error("publish rejected by all relays: {0}")]
    PublishRejected(String),
    /// The transport could not be reached at all.
    #[error("transport unreachable: {0}")]
    Unreachable(String),
}

/// Per-relay outcome of a publish attempt.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Whether at least one relay accepted the event.
    pub ok: bool,
    /// Relays that accepted it, if any did.
    pub relays: Vec<String>,
    /// Error detail, if `ok` is false.
    pub error: Option<String>,
}

/// Capability: fetch events by filter set, publish signed events.
///
/// No caller-visible policy beyond what's specified here — retry,
/// backoff and relay selection belong to whatever sits on top of this
/// trait, not to an implementation of it.
#[async_trait]
pub trait EventIO: Send + Sync {
    /// Fetch events matching any of `filters`. Implementations may
    /// return duplicates across relays; callers dedupe by `id`.
    async fn fetch_events(&self, filters: &[Filter]) -> Result<Vec<Event>, TransportError>;

    /// Publish `event`, returning per-relay acceptance.
    async fn publish_event(&self, event: Event) -> Result<PublishOutcome, TransportError>;
}

/// Deduplicate a batch of events by `id`, keeping first-seen order.
///
/// §4.B: "Ordering across relays is not guaranteed; the caller
/// deduplicates by `id`."
pub fn dedup_by_id(events: Vec<Event>) -> Vec<Event> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        if seen.insert(event.id) {
            out.push(event);
        }
    }
    out
}

/// In-memory [`EventIO`] for tests: a single shared event log, published
/// events accepted unconditionally by one notional relay.
#[derive(Default)]
pub struct MemoryEventIO {
    events: Mutex<Vec<Event>>,
    relay_name: String,
    rejected_ids: Mutex<HashMap<EventId, String>>,
}

impl MemoryEventIO {
    /// Empty transport, seeded events accepted on one relay named `relay_name`.
    pub fn new(relay_name: impl Into<String>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            relay_name: relay_name.into(),
            rejected_ids: Mutex::new(HashMap::new()),
        }
    }

    /// Pre-seed an event as if it had been fetched from a relay.
    pub fn seed(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    /// Make the next publish of `id` fail with `reason`, simulating a
    /// relay-side rejection (used to test callers' error handling).
    pub fn reject(&self, id: EventId, reason: impl Into<String>) {
        self.rejected_ids.lock().unwrap().insert(id, reason.into());
    }
}

#[async_trait]
impl EventIO for MemoryEventIO {
    async fn fetch_events(&self, filters: &[Filter]) -> Result<Vec<Event>, TransportError> {
        let events = self.events.lock().unwrap();
        Ok(events
            .iter()
            .filter(|e| filters.is_empty() || filters.iter().any(|f| f.matches(e)))
            .cloned()
            .collect())
    }

    async fn publish_event(&self, event: Event) -> Result<PublishOutcome, TransportError> {
        if let Some(reason) = self.rejected_ids.lock().unwrap().remove(&event.id) {
            return Ok(PublishOutcome {
                ok: false,
                relays: Vec::new(),
                error: Some(reason),
            });
        }
        self.events.lock().unwrap().push(event);
        Ok(PublishOutcome {
            ok: true,
            relays: vec![self.relay_name.clone()],
            error: None,
        })
    }
}
