// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::info;

use super::directory::IdentityDirectory;
use crate::error::{SocialError, SocialResult};
use crate::metrics::SocialMetrics;
use crate::models::blocking::{BlockOutcome, BlockedIdentity};
use crate::store::RelationshipStore;

/// Directional blocks, always queried in both directions.
#[derive(Clone)]
pub struct BlockList {
    store: Arc<dyn RelationshipStore>,
    directory: IdentityDirectory,
    metrics: SocialMetrics,
}

impl BlockList {
    pub fn new(store: Arc<dyn RelationshipStore>, directory: IdentityDirectory, metrics: SocialMetrics) -> Self {
        Self {
            store,
            directory,
            metrics,
        }
    }

    /// Block `target`, severing any friend request record for the pair in
    /// the same write.
    pub async fn block(&self, blocker: &str, target: &str) -> SocialResult<BlockOutcome> {
        if blocker == target {
            return Err(SocialError::SelfReference);
        }

        let outcome = self.store.block(blocker, target).await?;
        if outcome.created {
            self.metrics.blocks.with_label_values(&["blocked"]).inc();
        }
        info!(
            "{} blocked {} (severed: {}, new: {})",
            blocker, target, outcome.severed, outcome.created
        );
        Ok(outcome)
    }

    /// Remove the `blocker -> target` block. Absent blocks are not an error.
    pub async fn unblock(&self, blocker: &str, target: &str) -> SocialResult<bool> {
        let removed = self.store.unblock(blocker, target).await?;
        if removed {
            self.metrics.blocks.with_label_values(&["unblocked"]).inc();
            info!("{} unblocked {}", blocker, target);
        }
        Ok(removed)
    }

    pub async fn is_blocked(&self, a: &str, b: &str) -> SocialResult<bool> {
        Ok(self.store.is_blocked(a, b).await?)
    }

    /// Identities `identity` has blocked, newest first.
    pub async fn list_blocked(&self, identity: &str) -> SocialResult<Vec<BlockedIdentity>> {
        let blocks = self.store.blocks_by(identity).await?;
        let ids: Vec<String> = blocks.iter().map(|block| block.blocked_id.clone()).collect();
        let summaries = self.directory.summaries(&ids).await?;

        Ok(blocks
            .into_iter()
            .zip(summaries)
            .map(|(block, identity)| BlockedIdentity {
                identity,
                blocked_at: block.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::friendship::NewFriendRequest;
    use crate::store::MemoryStore;
    use tokio_test::assert_err;

    fn block_list() -> (BlockList, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let directory = IdentityDirectory::new(store.clone());
        let metrics = SocialMetrics::new().unwrap();
        (BlockList::new(store.clone(), directory, metrics), store)
    }

    #[tokio::test]
    async fn cannot_block_self() {
        let (blocks, _) = block_list();
        let err = assert_err!(blocks.block("alice", "alice").await);
        assert!(matches!(err, SocialError::SelfReference));
    }

    #[tokio::test]
    async fn block_severs_pending_request_and_is_idempotent() {
        let (blocks, store) = block_list();
        let at = chrono::Utc::now().naive_utc();
        store
            .insert_request(NewFriendRequest::pending("bob", "alice", at), None)
            .await
            .unwrap();

        let first = blocks.block("alice", "bob").await.unwrap();
        assert_eq!(first, BlockOutcome { severed: true, created: true });
        assert!(store.request_between("alice", "bob").await.unwrap().is_none());

        let second = blocks.block("alice", "bob").await.unwrap();
        assert_eq!(second, BlockOutcome { severed: false, created: false });
        assert_eq!(blocks.list_blocked("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn block_is_directional_but_checked_both_ways() {
        let (blocks, _) = block_list();
        blocks.block("alice", "bob").await.unwrap();

        assert!(blocks.is_blocked("alice", "bob").await.unwrap());
        assert!(blocks.is_blocked("bob", "alice").await.unwrap());
        assert!(blocks.list_blocked("bob").await.unwrap().is_empty());

        // only the blocker can lift it
        assert!(!blocks.unblock("bob", "alice").await.unwrap());
        assert!(blocks.unblock("alice", "bob").await.unwrap());
        assert!(!blocks.is_blocked("bob", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn unblocking_nothing_is_fine() {
        let (blocks, _) = block_list();
        assert!(!blocks.unblock("alice", "bob").await.unwrap());
    }
}
