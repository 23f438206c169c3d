// Distributed under the MIT software license

//! Unix timestamp, seconds resolution.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Unix timestamp (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Wrap a raw unix-seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time.
    ///
    /// Prefer [`crate::Clock`] at call sites that need deterministic tests;
    /// this is the default implementation used by it.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(secs)
    }

    /// Raw unix-seconds value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Capability: read the current time.
///
/// Grounded in the teacher's `nostr::types::time` abstraction over
/// [`Timestamp`]; exists so cache-freshness and TTL logic (§3, §4.K) is
/// deterministically testable instead of reading [`SystemTime`] inline.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_u64_round_trips_from_secs() {
        assert_eq!(Timestamp::from_secs(1_700_000_000).as_u64(), 1_700_000_000);
    }

    #[test]
    fn ordering_follows_the_raw_value() {
        assert!(Timestamp::from_secs(10) < Timestamp::from_secs(20));
    }

    #[test]
    fn system_clock_returns_a_plausible_unix_time() {
        let now = SystemClock.now();
        assert!(now.as_u64() > 1_700_000_000);
    }
}
