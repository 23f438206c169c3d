// Distributed under the MIT software license

//! NIP01: addressable event coordinates (`a` tags).
//!
//! <https://github.com/nostr-protocol/nips/blob/master/01.md>

use std::fmt;
use std::str::FromStr;

use crate::{Kind, PublicKey};

/// Error parsing a [`Coordinate`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Malformed `kind:pubkey:identifier` triple.
    #[error("invalid coordinate")]
    Invalid,
    /// Bad kind component.
    #[error("invalid coordinate kind: {0}")]
    Kind(#[source] std::num::ParseIntError),
    /// Bad pubkey component.
    #[error("invalid coordinate pubkey: {0}")]
    PublicKey(#[from] crate::key::Error),
}

/// Address of an addressable/replaceable event: `<kind>:<pubkey>:<d-tag>`.
///
/// For repo announcements (kind 30617) this is the repo-address the rest
/// of the protocol (patches, issues, PRs, stacks) points back at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// Event kind.
    pub kind: Kind,
    /// Author.
    pub public_key: PublicKey,
    /// `d` tag identifier (repo-id for git events).
    pub identifier: String,
}

impl Coordinate {
    /// Build a new coordinate.
    pub fn new(kind: Kind, public_key: PublicKey, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            public_key,
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.kind.as_u32(),
            self.public_key.to_hex(),
            self.identifier
        )
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let kind_str = parts.next().ok_or(Error::Invalid)?;
        let pubkey_str = parts.next().ok_or(Error::Invalid)?;
        let identifier = parts.next().unwrap_or_default().to_string();

        let kind_n: u32 = kind_str.parse().map_err(Error::Kind)?;
        let public_key = PublicKey::from_hex(pubkey_str)?;

        Ok(Self {
            kind: Kind::from(kind_n),
            public_key,
            identifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keys;

    #[test]
    fn display_and_parse_round_trip() {
        let public_key = Keys::generate().public_key();
        let coordinate = Coordinate::new(Kind::GitRepoAnnouncement, public_key, "widgets");
        let s = coordinate.to_string();
        let parsed: Coordinate = s.parse().unwrap();
        assert_eq!(parsed, coordinate);
    }

    #[test]
    fn parse_rejects_a_non_numeric_kind() {
        let public_key = Keys::generate().public_key();
        let bad = format!("notanumber:{}:widgets", public_key.to_hex());
        assert!(matches!(bad.parse::<Coordinate>(), Err(Error::Kind(_))));
    }

    #[test]
    fn parse_rejects_a_malformed_pubkey() {
        assert!(matches!("30617:zz:widgets".parse::<Coordinate>(), Err(Error::PublicKey(_))));
    }

    #[test]
    fn identifier_may_contain_colons() {
        let public_key = Keys::generate().public_key();
        let s = format!("30617:{}:a:b:c", public_key.to_hex());
        let parsed: Coordinate = s.parse().unwrap();
        assert_eq!(parsed.identifier, "a:b:c");
    }
}
