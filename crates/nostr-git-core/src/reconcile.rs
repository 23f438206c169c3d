// Distributed under the MIT software license

//! Repo-State Reconciler (§4.C): turn a set of kind-30618 repo-state
//! events into one coherent [`RefMap`], bounded by a maintainer set and
//! a latest-writer-wins rule per ref.

use std::collections::{BTreeMap, BTreeSet};

use nostr::nips::nip34::{CodecOptions, RepoAnnouncement, RepoState};
use nostr::{Event, EventId, Kind, PublicKey, Timestamp};

/// One ref's winning contribution: commit plus provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord {
    /// Commit id, or for `HEAD` the symbolic target.
    pub commit: String,
    /// Event that contributed the winning value.
    pub event_id: EventId,
    /// That event's timestamp.
    pub created_at: Timestamp,
    /// That event's author.
    pub pubkey: PublicKey,
}

/// Reconciled mapping of ref name (`refs/heads/*`, `refs/tags/*`, `HEAD`)
/// to its winning [`RefRecord`].
pub type RefMap = BTreeMap<String, RefRecord>;

/// `true` if `candidate` should replace `incumbent` under the
/// latest-writer-wins rule: strictly greater `created_at`, ties broken
/// by the greater `eventId` (§3, §8 invariant 2).
fn wins(candidate: &RefRecord, incumbent: &RefRecord) -> bool {
    (candidate.created_at, candidate.event_id) > (incumbent.created_at, incumbent.event_id)
}

/// Derive the maintainer set for a repo: the announcement's `maintainers`
/// tag plus the owner pubkey, which is implicitly a maintainer (§4.C).
pub fn maintainer_set(owner: PublicKey, announcement: &RepoAnnouncement) -> BTreeSet<PublicKey> {
    let mut set: BTreeSet<PublicKey> = announcement.maintainers.iter().copied().collect();
    set.insert(owner);
    set
}

/// Reconcile a set of kind-30618 events into one [`RefMap`].
///
/// Events from a pubkey outside `maintainers` are dropped entirely
/// before any per-ref comparison runs (§8 invariant 1: maintainer
/// bounding). Events that fail to parse (no mandatory `d` tag, say) are
/// skipped rather than aborting the whole reconciliation — one
/// malformed announcement should not poison every other ref.
pub fn reconcile_ref_map(events: &[Event], maintainers: &BTreeSet<PublicKey>) -> RefMap {
    let mut out: RefMap = BTreeMap::new();
    for event in events {
        if event.kind != Kind::GitRepoState {
            continue;
        }
        if !maintainers.contains(&event.pubkey) {
            continue;
        }
        let state = match RepoState::from_event(event, CodecOptions::lenient()) {
            Ok(state) => state,
            Err(_) => continue,
        };
        for r in state.refs {
            let candidate = RefRecord {
                commit: r.value,
                event_id: event.id,
                created_at: event.created_at,
                pubkey: event.pubkey,
            };
            match out.get(&r.name) {
                Some(incumbent) if !wins(&candidate, incumbent) => {}
                _ => {
                    out.insert(r.name, candidate);
                }
            }
        }
    }
    out
}

/// One logical repository formed by grouping announcements that share an
/// earliest-unique-commit identity (§3, §4.C, §8 invariant 6).
#[derive(Debug, Clone)]
pub struct EucGroup {
    /// The shared earliest-unique-commit value.
    pub euc: String,
    /// Every `(owner, announcement)` pair observed for this EUC, in
    /// first-seen order — authorship stays per-pubkey even though the
    /// group's URLs/maintainers are unioned.
    pub members: Vec<(PublicKey, RepoAnnouncement)>,
}

impl EucGroup {
    /// Union of every member's announced clone URLs, de-duplicated,
    /// first-seen order preserved.
    pub fn clone_urls(&self) -> Vec<url::Url> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for (_, ann) in &self.members {
            for url in &ann.clone {
                if seen.insert(url.to_string()) {
                    out.push(url.clone());
                }
            }
        }
        out
    }

    /// Union of every member's maintainer set, owners included.
    pub fn maintainers(&self) -> BTreeSet<PublicKey> {
        let mut set = BTreeSet::new();
        for (owner, ann) in &self.members {
            set.extend(maintainer_set(*owner, ann));
        }
        set
    }
}

/// Group `(owner, announcement)` pairs by shared `r:euc` value.
///
/// Announcements with no EUC tag are not grouped with anything (each
/// stays a distinct, single-announcement repository as far as this
/// function is concerned) and are returned separately.
pub fn group_by_euc(announcements: Vec<(PublicKey, RepoAnnouncement)>) -> (Vec<EucGroup>, Vec<(PublicKey, RepoAnnouncement)>) {
    let mut grouped: BTreeMap<String, EucGroup> = BTreeMap::new();
    let mut ungrouped = Vec::new();
    for (owner, ann) in announcements {
        match ann.euc.clone() {
            Some(euc) => {
                grouped
                    .entry(euc.clone())
                    .or_insert_with(|| EucGroup { euc, members: Vec::new() })
                    .members
                    .push((owner, ann));
            }
            None => ungrouped.push((owner, ann)),
        }
    }
    (grouped.into_values().collect(), ungrouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::event::tag::Tag;
    use nostr::{EventBuilder, Keys};

    fn state_event(keys: &Keys, branch_commit: &str, created_at: u64) -> Event {
        EventBuilder::new(Kind::GitRepoState, "")
            .tags(vec![
                Tag::identifier("my-repo"),
                Tag::custom("refs/heads/main", vec![branch_commit.into()]),
            ])
            .sign(keys, Timestamp::from_secs(created_at))
            .unwrap()
    }

    #[test]
    fn s1_maintainer_bounding() {
        let a = Keys::generate();
        let b = Keys::generate();
        let e1 = state_event(&a, "aaa", 10);
        let e2 = state_event(&b, "bbb", 20);
        let maintainers: BTreeSet<PublicKey> = [a.public_key()].into_iter().collect();

        let refmap = reconcile_ref_map(&[e1.clone(), e2], &maintainers);
        let entry = refmap.get("refs/heads/main").unwrap();
        assert_eq!(entry.commit, "aaa");
        assert_eq!(entry.pubkey, a.public_key());
        assert_eq!(entry.created_at, Timestamp::from_secs(10));
        assert_eq!(entry.event_id, e1.id);
    }

    #[test]
    fn latest_writer_wins_among_maintainers() {
        let a = Keys::generate();
        let e1 = state_event(&a, "aaa", 10);
        let e2 = state_event(&a, "bbb", 20);
        let maintainers: BTreeSet<PublicKey> = [a.public_key()].into_iter().collect();

        let refmap = reconcile_ref_map(&[e1, e2], &maintainers);
        assert_eq!(refmap.get("refs/heads/main").unwrap().commit, "bbb");
    }

    #[test]
    fn tie_breaks_by_greater_event_id() {
        let a = Keys::generate();
        let e1 = state_event(&a, "aaa", 10);
        let e2 = state_event(&a, "bbb", 10);
        let maintainers: BTreeSet<PublicKey> = [a.public_key()].into_iter().collect();

        let refmap = reconcile_ref_map(&[e1.clone(), e2.clone()], &maintainers);
        let expected = if e1.id > e2.id { "aaa" } else { "bbb" };
        assert_eq!(refmap.get("refs/heads/main").unwrap().commit, expected);
    }

    #[test]
    fn euc_identity_groups_regardless_of_d_tag() {
        let a = Keys::generate();
        let b = Keys::generate();
        let ann_a = RepoAnnouncement {
            id: "repo-a".into(),
            name: None,
            description: None,
            web: vec![],
            clone: vec![url::Url::parse("https://host-a/repo.git").unwrap()],
            relays: vec![],
            euc: Some("root-commit".into()),
            maintainers: vec![],
            topics: vec![],
        };
        let ann_b = RepoAnnouncement {
            id: "repo-b".into(),
            clone: vec![url::Url::parse("https://host-b/repo.git").unwrap()],
            ..ann_a.clone()
        };

        let (groups, ungrouped) = group_by_euc(vec![(a.public_key(), ann_a), (b.public_key(), ann_b)]);
        assert_eq!(groups.len(), 1);
        assert!(ungrouped.is_empty());
        assert_eq!(groups[0].clone_urls().len(), 2);
        assert!(groups[0].maintainers().contains(&a.public_key()));
        assert!(groups[0].maintainers().contains(&b.public_key()));
    }
}
