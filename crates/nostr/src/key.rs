// Distributed under the MIT software license

//! Keys and the signing capability.
//!
//! Signing is modeled as a capability (§5): a function from an unsigned
//! event to a signed one. The core never holds a private key directly —
//! callers provide a [`Signer`] implementation, which may forward the
//! request across a thread/worker boundary.

use std::fmt;
use std::str::FromStr;

use secp256k1::rand::rngs::OsRng;
use secp256k1::{Keypair, Message, Secp256k1, XOnlyPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::event::unsigned::UnsignedEvent;
use crate::Event;

/// Key-related error
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Hex decode error
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
    /// secp256k1 error
    #[error("secp256k1 error: {0}")]
    Secp256k1(String),
}

impl From<secp256k1::Error> for Error {
    fn from(e: secp256k1::Error) -> Self {
        Self::Secp256k1(e.to_string())
    }
}

/// Schnorr public key (32-byte x-only).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(XOnlyPublicKey);

impl PublicKey {
    /// Parse from 32-byte hex.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        Ok(Self(XOnlyPublicKey::from_str(s)?))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        self.0.to_string()
    }

    /// Raw inner key.
    pub fn inner(&self) -> &XOnlyPublicKey {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Secret key, used only to construct an in-process [`Keys`] signer.
#[derive(Clone)]
pub struct SecretKey(Keypair);

/// An in-process signing key pair.
///
/// Production deployments more commonly hand the core a [`Signer`]
/// implementation that forwards to a remote key custodian; `Keys` exists
/// for tests and for single-process tools that hold the key directly.
#[derive(Clone)]
pub struct Keys {
    key_pair: Keypair,
    public_key: PublicKey,
}

impl Keys {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let key_pair = Keypair::new(&secp, &mut OsRng);
        let (xonly, _parity) = key_pair.x_only_public_key();
        Self {
            key_pair,
            public_key: PublicKey(xonly),
        }
    }

    /// Construct from a hex-encoded secret key.
    pub fn from_hex(secret_key: &str) -> Result<Self, Error> {
        let secp = Secp256k1::new();
        let bytes = hex::decode(secret_key)?;
        let key_pair = Keypair::from_seckey_slice(&secp, &bytes)?;
        let (xonly, _parity) = key_pair.x_only_public_key();
        Ok(Self {
            key_pair,
            public_key: PublicKey(xonly),
        })
    }

    /// Public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }
}

/// Signer error
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SignerError {
    /// Backend refused to sign
    #[error("signer backend error: {0}")]
    Backend(String),
}

/// Capability: sign an [`UnsignedEvent`] into a fully signed [`Event`].
///
/// Implementations may hold a local [`Keys`], forward to a hardware
/// wallet, or post an RPC to a browser extension / worker thread. The
/// core never assumes a particular backend (§5 Concurrency).
pub trait Signer: Send + Sync {
    /// Public key this signer signs for.
    fn public_key(&self) -> PublicKey;

    /// Sign `unsigned`, producing a verified [`Event`].
    fn sign_event(&self, unsigned: UnsignedEvent) -> Result<Event, SignerError>;
}

impl Signer for Keys {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign_event(&self, unsigned: UnsignedEvent) -> Result<Event, SignerError> {
        let secp = Secp256k1::new();
        let id = unsigned.id();
        let message = Message::from_digest(*id.as_bytes());
        let sig = secp.sign_schnorr_with_rng(&message, &self.key_pair, &mut OsRng);
        Ok(Event {
            id,
            pubkey: self.public_key,
            created_at: unsigned.created_at,
            kind: unsigned.kind,
            tags: unsigned.tags,
            content: unsigned.content,
            sig: sig.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_hex_round_trips() {
        let keys = Keys::generate();
        let hex = keys.public_key().to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(PublicKey::from_hex(&hex).unwrap(), keys.public_key());
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(PublicKey::from_hex("not hex").is_err());
    }

    #[test]
    fn keys_from_hex_round_trips_the_same_public_key() {
        let keys = Keys::generate();
        let secret_hex = hex::encode(keys.key_pair.secret_bytes());
        let restored = Keys::from_hex(&secret_hex).unwrap();
        assert_eq!(restored.public_key(), keys.public_key());
    }

    #[test]
    fn signer_stamps_the_pubkey_and_a_hex_signature_matching_the_id() {
        let keys = Keys::generate();
        let unsigned = UnsignedEvent {
            pubkey: keys.public_key(),
            created_at: crate::Timestamp::from_secs(1),
            kind: crate::Kind::GitPatch,
            tags: vec![],
            content: "hi".to_string(),
        };
        let expected_id = unsigned.id();
        let event = keys.sign_event(unsigned).unwrap();
        assert_eq!(event.pubkey, keys.public_key());
        assert_eq!(event.id, expected_id);
        assert!(event.verify_id());
        assert_eq!(event.sig.len(), 128);
    }
}
