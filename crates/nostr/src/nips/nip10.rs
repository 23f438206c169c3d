// Distributed under the MIT software license

//! NIP10: reply/root markers on `e` tags.
//!
//! <https://github.com/nostr-protocol/nips/blob/master/10.md>

use std::fmt;

/// Marker on an `e` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Points at the thread root.
    Root,
    /// Points at the immediate parent.
    Reply,
    /// Mentions, without implying thread structure.
    Mention,
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Root => "root",
            Self::Reply => "reply",
            Self::Mention => "mention",
        };
        f.write_str(s)
    }
}

impl Marker {
    /// Parse from the marker string found in the tag's 4th element.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "root" => Some(Self::Root),
            "reply" => Some(Self::Reply),
            "mention" => Some(Self::Mention),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_round_trip_for_every_variant() {
        for marker in [Marker::Root, Marker::Reply, Marker::Mention] {
            assert_eq!(Marker::parse(&marker.to_string()), Some(marker));
        }
    }

    #[test]
    fn parse_rejects_unknown_strings() {
        assert_eq!(Marker::parse("nonsense"), None);
    }
}
