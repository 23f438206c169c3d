// Distributed under the MIT software license

//! Thread Assembler (§4.N): pair a root (issue/patch/PR) with the comments
//! and status events that reference it, and pick the thread's final status.
//!
//! Grounded in [`nostr::nips::nip22::references_root`] for comment
//! membership; status membership is narrower (no `K`/`k` scoping — NIP-34
//! status events carry only `a`/`e` back to their root) so it is checked
//! directly here rather than reusing that helper.

use std::collections::BTreeSet;

use nostr::nips::nip01::Coordinate;
use nostr::nips::nip22::references_root;
use nostr::nips::nip34::ItemStatus;
use nostr::{Event, Kind, PublicKey};

/// A root event plus everything in its conversation.
#[derive(Debug, Clone)]
pub struct Thread {
    /// The issue/patch/PR root.
    pub root: Event,
    /// Comments (kind 1111) referencing the root, created-at ascending.
    pub comments: Vec<Event>,
    /// Status events (kinds 1630-1633) referencing the root, created-at ascending.
    pub statuses: Vec<Event>,
}

fn status_targets_root(event: &Event, root: &Event, root_address: Option<&Coordinate>) -> bool {
    let root_id_hex = root.id.to_hex();
    let by_id = event.get_tags("e").into_iter().any(|t| t.content() == Some(root_id_hex.as_str()));
    let by_address = match root_address {
        Some(addr) => {
            let addr_str = addr.to_string();
            event.get_tags("a").into_iter().any(|t| t.content() == Some(addr_str.as_str()))
        }
        None => false,
    };
    by_id || by_address
}

/// Assemble a [`Thread`] from `root` and a flat pool of `candidates`
/// (comments and statuses, possibly from multiple relays).
///
/// Candidates are deduplicated by `id` before classification, so a comment
/// and a status can never collide even if relays handed back the same
/// event twice under different fetch filters.
pub fn assemble_thread(root: Event, root_address: Option<&Coordinate>, candidates: Vec<Event>) -> Thread {
    let mut seen = BTreeSet::new();
    let mut comments = Vec::new();
    let mut statuses = Vec::new();

    for event in candidates {
        if !seen.insert(event.id) {
            continue;
        }
        if event.kind.is_git_status() {
            if status_targets_root(&event, &root, root_address) {
                statuses.push(event);
            }
        } else if references_root(&event, &root, root_address) {
            comments.push(event);
        }
    }

    comments.sort_by_key(|e| e.created_at);
    statuses.sort_by_key(|e| e.created_at);

    Thread { root, comments, statuses }
}

fn author_rank(event: &Event, root: &Event, maintainers: &BTreeSet<PublicKey>) -> u8 {
    if maintainers.contains(&event.pubkey) {
        2
    } else if event.pubkey == root.pubkey {
        1
    } else {
        0
    }
}

fn severity_rank(kind: Kind) -> u8 {
    match kind {
        Kind::GitStatusClosed => 3,
        Kind::GitStatusApplied => 2,
        Kind::GitStatusOpen => 1,
        Kind::GitStatusDraft => 0,
        _ => 0,
    }
}

/// Pick the thread's final status: highest author precedence (maintainer
/// > root author > others) wins; ties broken by status severity (closed >
/// applied > open > draft); remaining ties broken by the later `created_at`
/// (§4.N).
pub fn final_status<'a>(thread: &'a Thread, maintainers: &BTreeSet<PublicKey>) -> Option<&'a Event> {
    thread.statuses.iter().max_by(|a, b| {
        author_rank(a, &thread.root, maintainers)
            .cmp(&author_rank(b, &thread.root, maintainers))
            .then_with(|| severity_rank(a.kind).cmp(&severity_rank(b.kind)))
            .then_with(|| a.created_at.cmp(&b.created_at))
    })
}

/// Convenience: the [`ItemStatus`] corresponding to [`final_status`], or
/// [`ItemStatus::Open`] when the thread has no status events at all.
pub fn final_item_status(thread: &Thread, maintainers: &BTreeSet<PublicKey>) -> ItemStatus {
    match final_status(thread, maintainers).map(|e| e.kind) {
        Some(Kind::GitStatusApplied) => ItemStatus::Applied,
        Some(Kind::GitStatusClosed) => ItemStatus::Closed,
        Some(Kind::GitStatusDraft) => ItemStatus::Draft,
        _ => ItemStatus::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::event::tag::Tag;
    use nostr::{EventBuilder, Keys, Timestamp};

    fn sign_at(builder: EventBuilder, keys: &Keys, secs: u64) -> Event {
        builder.sign(keys, Timestamp::from_secs(secs)).unwrap()
    }

    #[test]
    fn assembles_comments_and_statuses_sorted_by_time() {
        let author = Keys::generate();
        let commenter = Keys::generate();
        let maintainer = Keys::generate();

        let root = sign_at(EventBuilder::new(Kind::GitIssue, "root issue"), &author, 100);

        let comment_late = sign_at(
            EventBuilder::new(Kind::Comment, "second").tags(vec![
                Tag::custom("E", vec![root.id.to_hex()]),
                Tag::custom("K", vec![Kind::GitIssue.as_u32().to_string()]),
            ]),
            &commenter,
            300,
        );
        let comment_early = sign_at(
            EventBuilder::new(Kind::Comment, "first").tags(vec![
                Tag::custom("E", vec![root.id.to_hex()]),
                Tag::custom("K", vec![Kind::GitIssue.as_u32().to_string()]),
            ]),
            &commenter,
            200,
        );
        let status = sign_at(
            EventBuilder::new(Kind::GitStatusOpen, "").tags(vec![Tag::event(root.id, None, None)]),
            &maintainer,
            250,
        );

        let thread = assemble_thread(
            root,
            None,
            vec![comment_late.clone(), comment_early.clone(), status.clone()],
        );

        assert_eq!(thread.comments, vec![comment_early, comment_late]);
        assert_eq!(thread.statuses, vec![status]);
    }

    #[test]
    fn final_status_prefers_maintainer_over_root_author() {
        let author = Keys::generate();
        let maintainer = Keys::generate();
        let root = sign_at(EventBuilder::new(Kind::GitIssue, "root"), &author, 100);

        let author_closes = sign_at(
            EventBuilder::new(Kind::GitStatusClosed, "").tags(vec![Tag::event(root.id, None, None)]),
            &author,
            200,
        );
        let maintainer_reopens = sign_at(
            EventBuilder::new(Kind::GitStatusOpen, "").tags(vec![Tag::event(root.id, None, None)]),
            &maintainer,
            150,
        );

        let maintainers: BTreeSet<PublicKey> = [maintainer.public_key()].into_iter().collect();
        let thread = assemble_thread(root, None, vec![author_closes, maintainer_reopens.clone()]);

        let winner = final_status(&thread, &maintainers).unwrap();
        assert_eq!(winner.id, maintainer_reopens.id);
    }

    #[test]
    fn final_status_breaks_ties_by_severity_then_recency() {
        let author = Keys::generate();
        let root = sign_at(EventBuilder::new(Kind::GitIssue, "root"), &author, 100);

        let opened = sign_at(
            EventBuilder::new(Kind::GitStatusOpen, "").tags(vec![Tag::event(root.id, None, None)]),
            &author,
            200,
        );
        let applied = sign_at(
            EventBuilder::new(Kind::GitStatusApplied, "").tags(vec![Tag::event(root.id, None, None)]),
            &author,
            200,
        );

        let maintainers = BTreeSet::new();
        let thread = assemble_thread(root, None, vec![opened, applied.clone()]);
        let winner = final_status(&thread, &maintainers).unwrap();
        assert_eq!(winner.id, applied.id);
    }
}
