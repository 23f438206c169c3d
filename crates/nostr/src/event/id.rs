// Distributed under the MIT software license

//! Event id

use std::fmt;
use std::str::FromStr;

use bitcoin_hashes::sha256::Hash as Sha256Hash;
use bitcoin_hashes::Hash;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

use crate::{Kind, PublicKey, Tag, Timestamp};

/// [`EventId`] error
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Hex decode error
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Invalid length
    #[error("invalid event id length")]
    InvalidLength,
}

/// 32-byte, lowercase hex-encoded sha256 of the serialized event data.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId([u8; 32]);

impl EventId {
    /// Compute an [`EventId`] from the fields the signature covers.
    ///
    /// Follows NIP-01: `sha256(json([0, pubkey, created_at, kind, tags, content]))`.
    pub fn new(
        pubkey: &PublicKey,
        created_at: Timestamp,
        kind: &Kind,
        tags: &[Tag],
        content: &str,
    ) -> Self {
        let json: Value = json!([
            0,
            pubkey.to_hex(),
            created_at.as_u64(),
            kind.as_u32(),
            tags,
            content,
        ]);
        let hash: Sha256Hash = Sha256Hash::hash(json.to_string().as_bytes());
        Self(hash.to_byte_array())
    }

    /// Build from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for EventId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| Error::InvalidLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.to_hex())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for EventId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keys;

    #[test]
    fn hex_round_trips() {
        let id = EventId::from_bytes([7u8; 32]);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(EventId::from_str(&hex).unwrap(), id);
    }

    #[test]
    fn from_str_rejects_wrong_length() {
        assert_eq!(EventId::from_str("deadbeef"), Err(Error::InvalidLength));
    }

    #[test]
    fn from_str_rejects_non_hex() {
        assert!(matches!(EventId::from_str("zz".repeat(32).as_str()), Err(Error::Hex(_))));
    }

    #[test]
    fn same_fields_hash_to_the_same_id() {
        let keys = Keys::generate();
        let id_a = EventId::new(&keys.public_key(), Timestamp::from_secs(100), &Kind::GitPatch, &[], "hello");
        let id_b = EventId::new(&keys.public_key(), Timestamp::from_secs(100), &Kind::GitPatch, &[], "hello");
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn differing_content_changes_the_id() {
        let keys = Keys::generate();
        let id_a = EventId::new(&keys.public_key(), Timestamp::from_secs(100), &Kind::GitPatch, &[], "hello");
        let id_b = EventId::new(&keys.public_key(), Timestamp::from_secs(100), &Kind::GitPatch, &[], "goodbye");
        assert_ne!(id_a, id_b);
    }
}
