// Distributed under the MIT software license

//! Event kinds used by the git collaboration protocol (§3).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named event kinds this workspace understands, plus an escape hatch for
/// anything else a relay might hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// 30617 — repo announcement
    GitRepoAnnouncement,
    /// 30618 — repo state
    GitRepoState,
    /// 1617 — patch
    GitPatch,
    /// 1618 — pull request open
    GitPullRequest,
    /// 1619 — pull request update
    GitPullRequestUpdate,
    /// 1621 — issue
    GitIssue,
    /// 1630 — status: open
    GitStatusOpen,
    /// 1631 — status: applied
    GitStatusApplied,
    /// 1632 — status: closed
    GitStatusClosed,
    /// 1633 — status: draft
    GitStatusDraft,
    /// 30410 — stack metadata
    GitStack,
    /// 30411 — merge-analysis metadata
    GitMergeMetadata,
    /// 30412 — conflict-details metadata
    GitConflictMetadata,
    /// 1111 — comment (NIP-22)
    Comment,
    /// 10317 — preferred mirror list
    MirrorList,
    /// 1985 — external label (NIP-32-style)
    Label,
    /// Anything not named above, carried by its raw numeric value.
    Custom(u32),
}

impl Kind {
    /// Raw numeric kind.
    pub fn as_u32(&self) -> u32 {
        match *self {
            Self::GitRepoAnnouncement => 30617,
            Self::GitRepoState => 30618,
            Self::GitPatch => 1617,
            Self::GitPullRequest => 1618,
            Self::GitPullRequestUpdate => 1619,
            Self::GitIssue => 1621,
            Self::GitStatusOpen => 1630,
            Self::GitStatusApplied => 1631,
            Self::GitStatusClosed => 1632,
            Self::GitStatusDraft => 1633,
            Self::GitStack => 30410,
            Self::GitMergeMetadata => 30411,
            Self::GitConflictMetadata => 30412,
            Self::Comment => 1111,
            Self::MirrorList => 10317,
            Self::Label => 1985,
            Self::Custom(n) => n,
        }
    }

    /// Whether this kind is "addressable": identified by `(kind, pubkey, d-tag)`
    /// and replaceable per-identifier, per NIP-01's 30000-39999 range.
    pub fn is_addressable(&self) -> bool {
        (30000..40000).contains(&self.as_u32())
    }

    /// `true` for the four git-status kinds (1630-1633).
    pub fn is_git_status(&self) -> bool {
        matches!(
            self,
            Self::GitStatusOpen | Self::GitStatusApplied | Self::GitStatusClosed | Self::GitStatusDraft
        )
    }
}

impl From<u32> for Kind {
    fn from(n: u32) -> Self {
        match n {
            30617 => Self::GitRepoAnnouncement,
            30618 => Self::GitRepoState,
            1617 => Self::GitPatch,
            1618 => Self::GitPullRequest,
            1619 => Self::GitPullRequestUpdate,
            1621 => Self::GitIssue,
            1630 => Self::GitStatusOpen,
            1631 => Self::GitStatusApplied,
            1632 => Self::GitStatusClosed,
            1633 => Self::GitStatusDraft,
            30410 => Self::GitStack,
            30411 => Self::GitMergeMetadata,
            30412 => Self::GitConflictMetadata,
            1111 => Self::Comment,
            10317 => Self::MirrorList,
            1985 => Self::Label,
            other => Self::Custom(other),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

impl Serialize for Kind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.as_u32())
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let n = u32::deserialize(deserializer)?;
        Ok(Self::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED: &[(Kind, u32)] = &[
        (Kind::GitRepoAnnouncement, 30617),
        (Kind::GitRepoState, 30618),
        (Kind::GitPatch, 1617),
        (Kind::GitPullRequest, 1618),
        (Kind::GitPullRequestUpdate, 1619),
        (Kind::GitIssue, 1621),
        (Kind::GitStatusOpen, 1630),
        (Kind::GitStatusApplied, 1631),
        (Kind::GitStatusClosed, 1632),
        (Kind::GitStatusDraft, 1633),
        (Kind::GitStack, 30410),
        (Kind::GitMergeMetadata, 30411),
        (Kind::GitConflictMetadata, 30412),
        (Kind::Comment, 1111),
        (Kind::MirrorList, 10317),
        (Kind::Label, 1985),
    ];

    #[test]
    fn every_named_kind_round_trips_through_its_numeric_value() {
        for (kind, n) in NAMED {
            assert_eq!(kind.as_u32(), *n);
            assert_eq!(Kind::from(*n), *kind);
        }
    }

    #[test]
    fn unknown_numbers_fall_back_to_custom() {
        assert_eq!(Kind::from(9999), Kind::Custom(9999));
        assert_eq!(Kind::Custom(9999).as_u32(), 9999);
    }

    #[test]
    fn is_addressable_covers_exactly_the_30000_range() {
        assert!(Kind::GitRepoAnnouncement.is_addressable());
        assert!(Kind::GitStack.is_addressable());
        assert!(!Kind::GitPatch.is_addressable());
        assert!(Kind::Custom(29999).is_addressable() == false);
        assert!(Kind::Custom(39999).is_addressable());
        assert!(!Kind::Custom(40000).is_addressable());
    }

    #[test]
    fn is_git_status_covers_exactly_the_four_status_kinds() {
        assert!(Kind::GitStatusOpen.is_git_status());
        assert!(Kind::GitStatusApplied.is_git_status());
        assert!(Kind::GitStatusClosed.is_git_status());
        assert!(Kind::GitStatusDraft.is_git_status());
        assert!(!Kind::GitPatch.is_git_status());
        assert!(!Kind::Custom(1630).is_git_status());
    }

    #[test]
    fn json_round_trips_as_a_bare_number() {
        let json = serde_json::to_string(&Kind::GitPatch).unwrap();
        assert_eq!(json, "1617");
        let back: Kind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Kind::GitPatch);
    }

    #[test]
    fn display_matches_the_numeric_value() {
        assert_eq!(Kind::GitIssue.to_string(), "1621");
    }
}
