// Distributed under the MIT software license

//! Filters (§4.B): `{kinds, authors, #<tag>:[values], since, until, limit}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Kind, PublicKey, Timestamp};

/// A filter expression handed to [`EventIO`](crate::EventIO)-shaped transports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Restrict to these kinds; empty means "any".
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub kinds: Vec<Kind>,
    /// Restrict to these authors; empty means "any".
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub authors: Vec<PublicKey>,
    /// Single-letter tag filters, e.g. `#a`, `#d`, `#e`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub tags: BTreeMap<char, Vec<String>>,
    /// Lower bound (inclusive) on `created_at`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub since: Option<Timestamp>,
    /// Upper bound (inclusive) on `created_at`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub until: Option<Timestamp>,
    /// Maximum number of events a relay should return.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub limit: Option<usize>,
}

impl Filter {
    /// An unconstrained filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to `kind`.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Restrict to `author`.
    pub fn author(mut self, author: PublicKey) -> Self {
        self.authors.push(author);
        self
    }

    /// Add a single-letter tag filter, e.g. `.tag('d', vec!["my-repo"])`.
    pub fn tag(mut self, letter: char, values: Vec<String>) -> Self {
        self.tags.entry(letter).or_default().extend(values);
        self
    }

    /// Set `since`.
    pub fn since(mut self, ts: Timestamp) -> Self {
        self.since = Some(ts);
        self
    }

    /// Set `limit`.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Whether `event` matches this filter.
    pub fn matches(&self, event: &crate::Event) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&event.pubkey) {
            return false;
        }
        if let Some(since) = self.since {
            if event.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.created_at > until {
                return false;
            }
        }
        for (letter, values) in &self.tags {
            let name = letter.to_string();
            let matched = event
                .tags
                .iter()
                .filter(|t| t.name() == name)
                .any(|t| t.content().map(|v| values.iter().any(|want| want == v)).unwrap_or(false));
            if !matched {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventBuilder, Keys, Tag};

    fn signed(kind: Kind, content: &str, tags: Vec<Tag>, created_at: u64) -> crate::Event {
        EventBuilder::new(kind, content)
            .tags(tags)
            .sign(&Keys::generate(), Timestamp::from_secs(created_at))
            .unwrap()
    }

    #[test]
    fn empty_filter_matches_anything() {
        let event = signed(Kind::GitPatch, "x", vec![], 10);
        assert!(Filter::new().matches(&event));
    }

    #[test]
    fn kind_filter_restricts_to_listed_kinds() {
        let event = signed(Kind::GitPatch, "x", vec![], 10);
        assert!(Filter::new().kind(Kind::GitPatch).matches(&event));
        assert!(!Filter::new().kind(Kind::GitIssue).matches(&event));
    }

    #[test]
    fn since_and_until_bound_created_at_inclusively() {
        let event = signed(Kind::GitPatch, "x", vec![], 100);
        assert!(Filter::new().since(Timestamp::from_secs(100)).matches(&event));
        assert!(!Filter::new().since(Timestamp::from_secs(101)).matches(&event));
        let bounded = Filter { until: Some(Timestamp::from_secs(100)), ..Filter::new() };
        assert!(bounded.matches(&event));
    }

    #[test]
    fn tag_filter_requires_a_matching_value_on_every_letter() {
        let event = signed(Kind::GitPatch, "x", vec![Tag::identifier("widgets")], 10);
        assert!(Filter::new().tag('d', vec!["widgets".into()]).matches(&event));
        assert!(!Filter::new().tag('d', vec!["other".into()]).matches(&event));
        assert!(!Filter::new().tag('p', vec!["anything".into()]).matches(&event));
    }

    #[test]
    fn author_filter_restricts_to_listed_pubkeys() {
        let keys = Keys::generate();
        let event = EventBuilder::new(Kind::GitPatch, "x").sign(&keys, Timestamp::from_secs(10)).unwrap();
        assert!(Filter::new().author(keys.public_key()).matches(&event));
        assert!(!Filter::new().author(Keys::generate().public_key()).matches(&event));
    }
}
