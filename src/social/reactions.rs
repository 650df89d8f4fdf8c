// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::SocialResult;
use crate::metrics::SocialMetrics;
use crate::models::reaction::{ReactionKind, ReactionOutcome, ReactionSummary};
use crate::store::ReactionStore;

/// One reaction per (post, identity), toggled.
#[derive(Clone)]
pub struct ReactionToggle {
    store: Arc<dyn ReactionStore>,
    metrics: SocialMetrics,
}

impl ReactionToggle {
    pub fn new(store: Arc<dyn ReactionStore>, metrics: SocialMetrics) -> Self {
        Self { store, metrics }
    }

    /// Apply `kind` to the identity's reaction on `post_id`.
    ///
    /// Unrecognized kinds are ignored rather than reported.
    pub async fn react(&self, post_id: &str, identity: &str, kind: &str) -> SocialResult<ReactionOutcome> {
        let outcome = match kind.parse::<ReactionKind>() {
            Ok(kind) => self.store.toggle_reaction(post_id, identity, kind).await?,
            Err(err) => {
                debug!("Ignoring reaction from {} on post {}: {}", identity, post_id, err);
                ReactionOutcome::Ignored
            }
        };

        self.metrics.reactions.with_label_values(&[outcome.label()]).inc();
        debug!("Reaction by {} on post {}: {:?}", identity, post_id, outcome);
        Ok(outcome)
    }

    pub async fn user_reaction(&self, post_id: &str, identity: &str) -> SocialResult<Option<ReactionKind>> {
        Ok(self.store.reaction_of(post_id, identity).await?)
    }

    /// Counts per kind, only for kinds with at least one reaction.
    pub async fn counts_by_kind(&self, post_id: &str) -> SocialResult<BTreeMap<ReactionKind, i64>> {
        Ok(self.store.reaction_counts(post_id).await?)
    }

    pub async fn summary(&self, post_id: &str, viewer: &str) -> SocialResult<ReactionSummary> {
        Ok(ReactionSummary {
            counts: self.counts_by_kind(post_id).await?,
            mine: self.user_reaction(post_id, viewer).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tracing_test::traced_test;

    fn toggle() -> ReactionToggle {
        ReactionToggle::new(Arc::new(MemoryStore::new()), SocialMetrics::new().unwrap())
    }

    #[tokio::test]
    async fn same_kind_twice_retracts() {
        let reactions = toggle();
        reactions.react("p1", "alice", "like").await.unwrap();
        let outcome = reactions.react("p1", "alice", "like").await.unwrap();

        assert_eq!(outcome, ReactionOutcome::Removed { kind: ReactionKind::Like });
        assert_eq!(reactions.user_reaction("p1", "alice").await.unwrap(), None);
        assert!(reactions.counts_by_kind("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn different_kind_overwrites() {
        let reactions = toggle();
        reactions.react("p1", "alice", "like").await.unwrap();
        reactions.react("p1", "alice", "love").await.unwrap();

        let counts = reactions.counts_by_kind("p1").await.unwrap();
        assert_eq!(counts, BTreeMap::from([(ReactionKind::Love, 1)]));
        assert_eq!(
            reactions.user_reaction("p1", "alice").await.unwrap(),
            Some(ReactionKind::Love)
        );
    }

    #[tokio::test]
    async fn counts_span_identities_but_not_posts() {
        let reactions = toggle();
        reactions.react("p1", "alice", "haha").await.unwrap();
        reactions.react("p1", "bob", "haha").await.unwrap();
        reactions.react("p1", "carol", "sad").await.unwrap();
        reactions.react("p2", "alice", "angry").await.unwrap();

        let summary = reactions.summary("p1", "bob").await.unwrap();
        assert_eq!(summary.counts.get(&ReactionKind::Haha), Some(&2));
        assert_eq!(summary.counts.get(&ReactionKind::Sad), Some(&1));
        assert_eq!(summary.counts.get(&ReactionKind::Angry), None);
        assert_eq!(summary.mine, Some(ReactionKind::Haha));
    }

    #[tokio::test]
    #[traced_test]
    async fn unknown_kind_is_ignored_and_logged() {
        let reactions = toggle();
        reactions.react("p1", "alice", "wow").await.unwrap();
        let outcome = reactions.react("p1", "alice", "meh").await.unwrap();

        assert_eq!(outcome, ReactionOutcome::Ignored);
        assert_eq!(reactions.user_reaction("p1", "alice").await.unwrap(), Some(ReactionKind::Wow));
        assert!(logs_contain("unrecognized reaction kind value: meh"));
    }
}
