// Distributed under the MIT software license

//! Unsigned event — the input to the signing capability.

use crate::event::id::EventId;
use crate::key::PublicKey;
use crate::{Kind, Tag, Timestamp};

/// An event with its `id`/`sig` not yet computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    /// Author.
    pub pubkey: PublicKey,
    /// Creation time.
    pub created_at: Timestamp,
    /// Event kind.
    pub kind: Kind,
    /// Tags.
    pub tags: Vec<Tag>,
    /// Content.
    pub content: String,
}

impl UnsignedEvent {
    /// Compute the id this event would have once signed.
    pub fn id(&self) -> EventId {
        EventId::new(&self.pubkey, self.created_at, &self.kind, &self.tags, &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keys;

    #[test]
    fn id_matches_a_direct_event_id_computation_over_the_same_fields() {
        let pubkey = Keys::generate().public_key();
        let unsigned = UnsignedEvent {
            pubkey,
            created_at: Timestamp::from_secs(42),
            kind: Kind::GitIssue,
            tags: vec![Tag::identifier("widgets")],
            content: "hello".into(),
        };
        let expected = EventId::new(&pubkey, Timestamp::from_secs(42), &Kind::GitIssue, &unsigned.tags, "hello");
        assert_eq!(unsigned.id(), expected);
    }
}
