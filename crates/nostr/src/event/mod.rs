// Distributed under the MIT software license

//! Signed events (§3).

pub mod builder;
pub mod error;
pub mod id;
pub mod kind;
pub mod tag;
pub mod unsigned;

pub use self::builder::EventBuilder;
pub use self::error::Error;
pub use self::id::EventId;
pub use self::kind::Kind;
pub use self::tag::{Tag, TagListExt};

use serde::{Deserialize, Serialize};

use crate::key::PublicKey;
use crate::Timestamp;

/// A fully signed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event id.
    pub id: EventId,
    /// Author.
    pub pubkey: PublicKey,
    /// Creation time.
    pub created_at: Timestamp,
    /// Kind.
    pub kind: Kind,
    /// Tags, in document order.
    pub tags: Vec<Tag>,
    /// Content (markdown, unified diff, JSON sidecar...).
    pub content: String,
    /// Schnorr signature, hex-encoded.
    pub sig: String,
}

impl Event {
    /// Recompute this event's id from its fields and compare to `self.id`.
    pub fn verify_id(&self) -> bool {
        EventId::new(&self.pubkey, self.created_at, &self.kind, &self.tags, &self.content) == self.id
    }

    /// First tag named `name`.
    pub fn get_tag(&self, name: &str) -> Option<&Tag> {
        self.tags.get_tag(name)
    }

    /// All tags named `name`.
    pub fn get_tags(&self, name: &str) -> Vec<&Tag> {
        self.tags.get_tags(name)
    }

    /// First value of the first tag named `name`.
    pub fn get_tag_value(&self, name: &str) -> Option<&str> {
        self.tags.get_tag_value(name)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON string.
    pub fn as_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keys;

    fn sample_event() -> Event {
        let keys = Keys::generate();
        EventBuilder::new(Kind::GitPatch, "diff --git a b")
            .tag(Tag::identifier("widgets"))
            .sign(&keys, Timestamp::from_secs(10))
            .unwrap()
    }

    #[test]
    fn verify_id_detects_tampering() {
        let mut event = sample_event();
        assert!(event.verify_id());
        event.content = "tampered".into();
        assert!(!event.verify_id());
    }

    #[test]
    fn tag_lookups_delegate_to_the_tag_list() {
        let event = sample_event();
        assert_eq!(event.get_tag_value("d"), Some("widgets"));
        assert_eq!(event.get_tags("d").len(), 1);
        assert!(event.get_tag("missing").is_none());
    }

    #[test]
    fn json_round_trips_through_from_json_and_as_json() {
        let event = sample_event();
        let json = event.as_json().unwrap();
        let back = Event::from_json(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(Event::from_json("not json").is_err());
    }
}
