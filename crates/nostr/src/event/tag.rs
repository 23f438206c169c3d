// Distributed under the MIT software license

//! Tags.
//!
//! A tag is an ordered sequence of strings, the first of which names the
//! tag (§3). The codec preserves order and never collapses multi-value
//! tags such as `clone`, `relays` or `maintainers` into separate tags.

use std::fmt;

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::key::PublicKey;
use crate::nips::nip01::Coordinate;
use crate::nips::nip10::Marker;
use crate::EventId;

/// A single tag: `buf[0]` is the tag name, the rest are its values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    buf: Vec<String>,
}

/// Error building or parsing a tag.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A tag must have at least one element.
    #[error("empty tag")]
    Empty,
}

impl Tag {
    /// Build a tag from its raw string values. Fails if `values` is empty.
    pub fn new(values: Vec<String>) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(Error::Empty);
        }
        Ok(Self { buf: values })
    }

    /// Tag name (`buf[0]`).
    pub fn name(&self) -> &str {
        &self.buf[0]
    }

    /// First value after the name (`buf[1]`), if present.
    pub fn content(&self) -> Option<&str> {
        self.buf.get(1).map(String::as_str)
    }

    /// All values after the name.
    pub fn values(&self) -> &[String] {
        &self.buf[1..]
    }

    /// The full backing buffer, name included.
    pub fn as_slice(&self) -> &[String] {
        &self.buf
    }

    /// Addressable `d` identifier tag.
    pub fn identifier(id: impl Into<String>) -> Self {
        Self {
            buf: vec!["d".into(), id.into()],
        }
    }

    /// `p` public-key reference tag.
    pub fn public_key(pubkey: PublicKey) -> Self {
        Self {
            buf: vec!["p".into(), pubkey.to_hex()],
        }
    }

    /// `e` event-reference tag, optionally carrying a relay hint and marker.
    pub fn event(id: EventId, relay_hint: Option<String>, marker: Option<Marker>) -> Self {
        let mut buf = vec!["e".into(), id.to_hex()];
        buf.push(relay_hint.unwrap_or_default());
        if let Some(m) = marker {
            buf.push(m.to_string());
        }
        Self { buf }
    }

    /// `a` address-coordinate tag.
    pub fn address(coordinate: &Coordinate) -> Self {
        Self {
            buf: vec!["a".into(), coordinate.to_string()],
        }
    }

    /// `r` reference tag (commit ids, EUC pointers, ...), with optional marker suffix.
    pub fn reference(value: impl Into<String>, marker: Option<&str>) -> Self {
        let mut buf = vec!["r".into(), value.into()];
        if let Some(m) = marker {
            buf.push(m.into());
        }
        Self { buf }
    }

    /// `t` hashtag/topic tag.
    pub fn hashtag(value: impl Into<String>) -> Self {
        Self {
            buf: vec!["t".into(), value.into()],
        }
    }

    /// `alt` human-readable summary tag (NIP-31).
    pub fn alt(summary: impl Into<String>) -> Self {
        Self {
            buf: vec!["alt".into(), summary.into()],
        }
    }

    /// A custom named tag packing one or more values.
    pub fn custom(name: impl Into<String>, values: Vec<String>) -> Self {
        let mut buf = vec![name.into()];
        buf.extend(values);
        Self { buf }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.buf.join(", "))
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.buf.len()))?;
        for v in &self.buf {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TagVisitor;

        impl<'de> Visitor<'de> for TagVisitor {
            type Value = Tag;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-empty JSON array of strings")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut buf = Vec::new();
                while let Some(v) = seq.next_element::<String>()? {
                    buf.push(v);
                }
                Tag::new(buf).map_err(DeError::custom)
            }
        }

        deserializer.deserialize_seq(TagVisitor)
    }
}

/// Typed lookups over a tag list (§4.A: `getTag`/`getTags`/`getTagValue`).
pub trait TagListExt {
    /// First tag named `name`.
    fn get_tag(&self, name: &str) -> Option<&Tag>;

    /// All tags named `name`, in document order.
    fn get_tags(&self, name: &str) -> Vec<&Tag>;

    /// The first value (`buf[1]`) of the first tag named `name`.
    fn get_tag_value(&self, name: &str) -> Option<&str>;

    /// Remove all tags named `tag.name()`, then append `tag`.
    ///
    /// Matches the round-trip law `set(e, t)` in §8: at most one instance
    /// of a given tag name survives a `set` call (used for single-valued
    /// tags; multi-valued tags like `p`/`e`/`t` are appended directly
    /// instead of going through `set`).
    fn set(&mut self, tag: Tag);
}

impl TagListExt for Vec<Tag> {
    fn get_tag(&self, name: &str) -> Option<&Tag> {
        self.iter().find(|t| t.name() == name)
    }

    fn get_tags(&self, name: &str) -> Vec<&Tag> {
        self.iter().filter(|t| t.name() == name).collect()
    }

    fn get_tag_value(&self, name: &str) -> Option<&str> {
        self.get_tag(name).and_then(Tag::content)
    }

    fn set(&mut self, tag: Tag) {
        self.retain(|t| t.name() != tag.name());
        self.push(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nips::nip01::Coordinate;
    use crate::Kind;

    #[test]
    fn identifier_builds_a_d_tag() {
        let tag = Tag::identifier("my-repo");
        assert_eq!(tag.name(), "d");
        assert_eq!(tag.content(), Some("my-repo"));
    }

    #[test]
    fn event_tag_without_hint_or_marker_leaves_the_hint_slot_empty() {
        let id = EventId::from_bytes([1u8; 32]);
        let tag = Tag::event(id, None, None);
        assert_eq!(tag.as_slice(), &["e".to_string(), id.to_hex(), String::new()]);
    }

    #[test]
    fn event_tag_with_hint_and_marker_carries_both() {
        let id = EventId::from_bytes([2u8; 32]);
        let tag = Tag::event(id, Some("wss://relay.example".into()), Some(Marker::Reply));
        assert_eq!(tag.values()[0], id.to_hex());
        assert_eq!(tag.values()[1], "wss://relay.example");
        assert_eq!(tag.values()[2], Marker::Reply.to_string());
    }

    #[test]
    fn address_tag_round_trips_the_coordinate_string() {
        let coordinate = Coordinate::new(
            Kind::GitRepoAnnouncement,
            crate::Keys::generate().public_key(),
            "widgets",
        );
        let tag = Tag::address(&coordinate);
        assert_eq!(tag.name(), "a");
        assert_eq!(tag.content(), Some(coordinate.to_string().as_str()));
    }

    #[test]
    fn reference_tag_appends_an_optional_marker() {
        let plain = Tag::reference("deadbeef", None);
        assert_eq!(plain.values(), &["deadbeef".to_string()]);
        let marked = Tag::reference("deadbeef", Some("base"));
        assert_eq!(marked.values(), &["deadbeef".to_string(), "base".to_string()]);
    }

    #[test]
    fn custom_tag_packs_name_and_values() {
        let tag = Tag::custom("clone", vec!["https://a".into(), "https://b".into()]);
        assert_eq!(tag.name(), "clone");
        assert_eq!(tag.values(), &["https://a".to_string(), "https://b".to_string()]);
    }

    #[test]
    fn new_rejects_an_empty_buffer() {
        assert_eq!(Tag::new(vec![]), Err(Error::Empty));
    }

    #[test]
    fn json_round_trips_through_serde() {
        let tag = Tag::custom("t", vec!["rust".into()]);
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, r#"["t","rust"]"#);
        let back: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }

    #[test]
    fn deserialize_rejects_an_empty_array() {
        let result: Result<Tag, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }

    #[test]
    fn tag_list_ext_finds_first_match_and_all_matches() {
        let list = vec![
            Tag::hashtag("rust"),
            Tag::hashtag("git"),
            Tag::identifier("widgets"),
        ];
        assert_eq!(list.get_tag("t").unwrap().content(), Some("rust"));
        assert_eq!(list.get_tags("t").len(), 2);
        assert_eq!(list.get_tag_value("d"), Some("widgets"));
        assert!(list.get_tag("missing").is_none());
    }

    #[test]
    fn set_replaces_every_prior_instance_of_the_name() {
        let mut list = vec![Tag::identifier("old-a"), Tag::identifier("old-b")];
        list.set(Tag::identifier("new"));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].content(), Some("new"));
    }
}
