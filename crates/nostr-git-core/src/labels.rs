// Distributed under the MIT software license

//! Label Resolver (§4.M): merge an item's self-labels (`L`/`l`/`t` tags on
//! its own root event) with externally-applied kind-1985 label events that
//! target it, into one deduplicated, insertion-order-preserving list.
//!
//! Trust in external labelers is left to the caller (§9 Open Questions):
//! this resolver takes whatever `external` events it's handed and does not
//! filter by authority.

use std::collections::BTreeSet;

use nostr::nips::nip01::Coordinate;
use nostr::nips::nip34::ExternalLabel;
use nostr::Event;

/// Resolve the effective label set for `root`.
///
/// `root_address` is `root`'s coordinate when addressable (used to match
/// external labels applied by `a` rather than `e`); pass `None` otherwise.
pub fn resolve_labels(root: &Event, root_address: Option<&Coordinate>, external: &[Event]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    let mut push = |value: String, seen: &mut BTreeSet<String>, out: &mut Vec<String>| {
        if seen.insert(value.clone()) {
            out.push(value);
        }
    };

    for tag_name in ["L", "l", "t"] {
        for tag in root.get_tags(tag_name) {
            if let Some(v) = tag.content() {
                push(v.to_string(), &mut seen, &mut out);
            }
        }
    }

    for event in external {
        let Ok(label) = ExternalLabel::from_event(event) else {
            continue;
        };
        let matches_event = label.target_event == Some(root.id);
        let matches_address = match (&label.target_address, root_address) {
            (Some(addr), Some(root_addr)) => addr == root_addr,
            _ => false,
        };
        if !matches_event && !matches_address {
            continue;
        }
        for l in label.labels {
            push(l, &mut seen, &mut out);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr::event::tag::Tag;
    use nostr::{EventBuilder, Keys, Kind, Timestamp};

    fn sign(builder: EventBuilder, keys: &Keys) -> Event {
        builder.sign(keys, Timestamp::from_secs(1_700_000_000)).unwrap()
    }

    #[test]
    fn merges_self_and_external_labels_deduped() {
        let author = Keys::generate();
        let labeler = Keys::generate();

        let root = sign(
            EventBuilder::new(Kind::GitIssue, "bug report").tags(vec![Tag::hashtag("bug"), Tag::hashtag("p1")]),
            &author,
        );

        let external = sign(
            EventBuilder::new(Kind::Label, "").tags(vec![
                Tag::custom("L", vec!["org.example.priority".into()]),
                Tag::custom("l", vec!["bug".into()]),
                Tag::custom("l", vec!["needs-triage".into()]),
                Tag::event(root.id, None, None),
            ]),
            &labeler,
        );

        let labels = resolve_labels(&root, None, &[external]);
        assert_eq!(labels, vec!["bug", "p1", "needs-triage"]);
    }

    #[test]
    fn ignores_labels_targeting_a_different_event() {
        let author = Keys::generate();
        let labeler = Keys::generate();
        let root = sign(EventBuilder::new(Kind::GitIssue, "issue").tags(vec![Tag::hashtag("bug")]), &author);
        let other = sign(EventBuilder::new(Kind::GitIssue, "other issue"), &author);

        let external = sign(
            EventBuilder::new(Kind::Label, "")
                .tags(vec![Tag::custom("l", vec!["urgent".into()]), Tag::event(other.id, None, None)]),
            &labeler,
        );

        let labels = resolve_labels(&root, None, &[external]);
        assert_eq!(labels, vec!["bug"]);
    }
}
