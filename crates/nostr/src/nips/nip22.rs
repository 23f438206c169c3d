// Distributed under the MIT software license

//! NIP22: comments (kind 1111), threaded onto a root event or address.
//!
//! <https://github.com/nostr-protocol/nips/blob/master/22.md>

use crate::event::tag::{Tag, TagListExt};
use crate::nips::nip01::Coordinate;
use crate::{Event, EventId, Kind};

/// What a comment (or status event) points back at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentTarget {
    /// Root identified by event id.
    Event {
        /// Root event id.
        id: EventId,
        /// Root's kind, used for the `K`/`k` scope tags.
        kind: Kind,
    },
    /// Root identified by its addressable coordinate.
    Address {
        /// Root coordinate.
        address: Coordinate,
    },
}

impl CommentTarget {
    /// Build the uppercase root-pointer tags (`E`/`A`/`K`) for a comment
    /// or status event whose root is this target.
    pub fn root_tags(&self) -> Vec<Tag> {
        match self {
            Self::Event { id, kind } => vec![
                Tag::custom("E", vec![id.to_hex()]),
                Tag::custom("K", vec![kind.as_u32().to_string()]),
            ],
            Self::Address { address } => vec![
                Tag::custom("A", vec![address.to_string()]),
                Tag::custom("K", vec![address.kind.as_u32().to_string()]),
            ],
        }
    }

    /// Build the lowercase parent-pointer tags (`e`/`a`/`k`) for a reply
    /// whose immediate parent is this target.
    pub fn parent_tags(&self) -> Vec<Tag> {
        match self {
            Self::Event { id, kind } => vec![
                Tag::custom("e", vec![id.to_hex()]),
                Tag::custom("k", vec![kind.as_u32().to_string()]),
            ],
            Self::Address { address } => vec![
                Tag::custom("a", vec![address.to_string()]),
                Tag::custom("k", vec![address.kind.as_u32().to_string()]),
            ],
        }
    }
}

/// Whether `event` references `root` per NIP-22 (`E`/`e` to the root id,
/// `A`/`a` to its address, both optionally scoped by `K`/`k`).
///
/// `root_address` is the root's coordinate when it is an addressable
/// event (repo announcements, stacks, ...); `None` otherwise.
pub fn references_root(event: &Event, root: &Event, root_address: Option<&Coordinate>) -> bool {
    let scope_ok = |letter: &str| -> bool {
        match event.tags.get_tag_value(letter) {
            Some(k) => k.parse::<u32>().map(|n| n == root.kind.as_u32()).unwrap_or(true),
            None => true,
        }
    };

    let root_id_hex = root.id.to_hex();
    let by_id = ["E", "e"].iter().any(|name| {
        event
            .tags
            .get_tags(name)
            .into_iter()
            .any(|t| t.content() == Some(root_id_hex.as_str()))
    }) && (scope_ok("K") && scope_ok("k"));

    let by_address = match root_address {
        Some(addr) => {
            let addr_str = addr.to_string();
            ["A", "a"].iter().any(|name| {
                event
                    .tags
                    .get_tags(name)
                    .into_iter()
                    .any(|t| t.content() == Some(addr_str.as_str()))
            })
        }
        None => false,
    };

    by_id || by_address
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventBuilder, Keys};

    fn signed(kind: Kind, tags: Vec<Tag>) -> Event {
        EventBuilder::new(kind, "body")
            .tags(tags)
            .sign(&Keys::generate(), crate::Timestamp::from_secs(1))
            .unwrap()
    }

    #[test]
    fn event_target_root_and_parent_tags_use_upper_and_lower_case() {
        let root_id = EventId::from_bytes([9u8; 32]);
        let target = CommentTarget::Event { id: root_id, kind: Kind::GitIssue };
        let root_tags = target.root_tags();
        assert_eq!(root_tags[0].name(), "E");
        assert_eq!(root_tags[0].content(), Some(root_id.to_hex().as_str()));
        assert_eq!(root_tags[1].name(), "K");

        let parent_tags = target.parent_tags();
        assert_eq!(parent_tags[0].name(), "e");
        assert_eq!(parent_tags[1].name(), "k");
    }

    #[test]
    fn references_root_matches_by_event_id_and_scope() {
        let root = signed(Kind::GitIssue, vec![]);
        let target = CommentTarget::Event { id: root.id, kind: root.kind };
        let comment = signed(Kind::Comment, target.parent_tags());
        assert!(references_root(&comment, &root, None));
    }

    #[test]
    fn references_root_rejects_a_mismatched_scope() {
        let root = signed(Kind::GitIssue, vec![]);
        let comment = signed(
            Kind::Comment,
            vec![Tag::custom("e", vec![root.id.to_hex()]), Tag::custom("k", vec![Kind::GitPatch.as_u32().to_string()])],
        );
        assert!(!references_root(&comment, &root, None));
    }

    #[test]
    fn references_root_matches_by_address_when_given() {
        let pubkey = Keys::generate().public_key();
        let address = Coordinate::new(Kind::GitRepoAnnouncement, pubkey, "widgets");
        let root = signed(Kind::GitRepoAnnouncement, vec![Tag::identifier("widgets")]);
        let target = CommentTarget::Address { address: address.clone() };
        let comment = signed(Kind::Comment, target.parent_tags());
        assert!(references_root(&comment, &root, Some(&address)));
    }

    #[test]
    fn references_root_is_false_with_no_matching_tags() {
        let root = signed(Kind::GitIssue, vec![]);
        let comment = signed(Kind::Comment, vec![]);
        assert!(!references_root(&comment, &root, None));
    }
}
