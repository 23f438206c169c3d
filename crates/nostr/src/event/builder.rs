// Distributed under the MIT software license

//! Event builder.

use crate::event::unsigned::UnsignedEvent;
use crate::key::{PublicKey, Signer, SignerError};
use crate::{Kind, Tag, Timestamp};

/// Builds an event, then hands it to a [`Signer`] to finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBuilder {
    kind: Kind,
    tags: Vec<Tag>,
    content: String,
}

impl EventBuilder {
    /// Start a new builder for `kind` with the given `content`.
    pub fn new(kind: Kind, content: impl Into<String>) -> Self {
        Self {
            kind,
            tags: Vec::new(),
            content: content.into(),
        }
    }

    /// Replace the tag list.
    pub fn tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Append one tag.
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Finalize into an [`UnsignedEvent`] for `pubkey` at `created_at`.
    pub fn to_unsigned(self, pubkey: PublicKey, created_at: Timestamp) -> UnsignedEvent {
        UnsignedEvent {
            pubkey,
            created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
        }
    }

    /// Sign with `signer`, stamping `created_at` as the current time.
    pub fn sign(self, signer: &dyn Signer, created_at: Timestamp) -> Result<crate::Event, SignerError> {
        let unsigned = self.to_unsigned(signer.public_key(), created_at);
        signer.sign_event(unsigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keys;

    #[test]
    fn tag_appends_while_tags_replaces() {
        let builder = EventBuilder::new(Kind::GitIssue, "body")
            .tag(Tag::hashtag("rust"))
            .tag(Tag::hashtag("git"));
        assert_eq!(builder.clone().to_unsigned(Keys::generate().public_key(), Timestamp::from_secs(1)).tags.len(), 2);

        let replaced = builder.tags(vec![Tag::identifier("widgets")]);
        assert_eq!(replaced.to_unsigned(Keys::generate().public_key(), Timestamp::from_secs(1)).tags.len(), 1);
    }

    #[test]
    fn to_unsigned_stamps_the_requested_pubkey_and_time() {
        let pubkey = Keys::generate().public_key();
        let unsigned = EventBuilder::new(Kind::GitPatch, "diff").to_unsigned(pubkey, Timestamp::from_secs(99));
        assert_eq!(unsigned.pubkey, pubkey);
        assert_eq!(unsigned.created_at, Timestamp::from_secs(99));
        assert_eq!(unsigned.kind, Kind::GitPatch);
        assert_eq!(unsigned.content, "diff");
    }

    #[test]
    fn sign_produces_a_self_consistent_event() {
        let keys = Keys::generate();
        let event = EventBuilder::new(Kind::GitIssue, "bug report")
            .tag(Tag::identifier("widgets"))
            .sign(&keys, Timestamp::from_secs(5))
            .unwrap();
        assert!(event.verify_id());
        assert_eq!(event.pubkey, keys.public_key());
    }
}
