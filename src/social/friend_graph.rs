// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::directory::IdentityDirectory;
use crate::error::{SocialError, SocialResult};
use crate::metrics::SocialMetrics;
use crate::models::friendship::{
    Friend, FriendRequest, FriendRequestStatus, FriendStatus, IdentityMatch, NewFriendRequest, PendingRequest,
};
use crate::store::RelationshipStore;

/// Per-pair friend request state machine.
///
/// A pair has at most one record. `pending` and `accepted` block new
/// requests in either direction; a `rejected` record is replaced by a fresh
/// request from whichever side sends next.
#[derive(Clone)]
pub struct FriendGraph {
    store: Arc<dyn RelationshipStore>,
    directory: IdentityDirectory,
    metrics: SocialMetrics,
}

impl FriendGraph {
    pub fn new(store: Arc<dyn RelationshipStore>, directory: IdentityDirectory, metrics: SocialMetrics) -> Self {
        Self {
            store,
            directory,
            metrics,
        }
    }

    pub async fn send_request(&self, requester: &str, receiver: &str) -> SocialResult<FriendRequest> {
        if requester == receiver {
            return Err(SocialError::SelfReference);
        }

        let replacing = match self.store.request_between(requester, receiver).await? {
            Some(existing) => match existing.status {
                FriendRequestStatus::Pending => return Err(SocialError::AlreadyPending),
                FriendRequestStatus::Accepted => return Err(SocialError::AlreadyFriends),
                FriendRequestStatus::Rejected => Some(existing.id),
            },
            None => None,
        };

        let request = NewFriendRequest::pending(requester, receiver, Utc::now().naive_utc());
        match self.store.insert_request(request, replacing).await {
            Ok(stored) => {
                self.metrics.friend_requests.with_label_values(&["sent"]).inc();
                info!("Friend request {} sent from {} to {}", stored.id, requester, receiver);
                Ok(stored)
            }
            Err(err) if err.is_conflict() => {
                // Lost a race against another request for the same pair.
                debug!("Friend request {} -> {} collided, re-reading pair", requester, receiver);
                match self.store.request_between(requester, receiver).await? {
                    Some(winner) if winner.status == FriendRequestStatus::Pending => Err(SocialError::AlreadyPending),
                    Some(winner) if winner.status == FriendRequestStatus::Accepted => Err(SocialError::AlreadyFriends),
                    _ => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Accept a pending request addressed to `acting`.
    pub async fn accept_request(&self, request_id: i32, acting: &str) -> SocialResult<FriendRequest> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or(SocialError::NotFound("friend request"))?;

        if request.receiver_id != acting {
            return Err(SocialError::Unauthorized);
        }
        if request.status != FriendRequestStatus::Pending {
            return Err(SocialError::AlreadyProcessed);
        }

        let accepted = self
            .store
            .accept_pending(request_id)
            .await?
            .ok_or(SocialError::AlreadyProcessed)?;

        self.metrics.friend_requests.with_label_values(&["accepted"]).inc();
        info!("Friend request {} accepted by {}", request_id, acting);
        Ok(accepted)
    }

    /// Reject a request addressed to `acting`, whatever its current status.
    pub async fn reject_request(&self, request_id: i32, acting: &str) -> SocialResult<FriendRequest> {
        let request = self
            .store
            .request_by_id(request_id)
            .await?
            .ok_or(SocialError::NotFound("friend request"))?;

        if request.receiver_id != acting {
            return Err(SocialError::Unauthorized);
        }

        let rejected = self
            .store
            .reject(request_id)
            .await?
            .ok_or(SocialError::NotFound("friend request"))?;

        self.metrics.friend_requests.with_label_values(&["rejected"]).inc();
        info!("Friend request {} rejected by {}", request_id, acting);
        Ok(rejected)
    }

    /// Remove the pair's record regardless of status.
    pub async fn delete_relationship(&self, a: &str, b: &str) -> SocialResult<bool> {
        let removed = self.store.delete_between(a, b).await?;
        if removed {
            debug!("Removed relationship record between {} and {}", a, b);
        }
        Ok(removed)
    }

    /// End an accepted friendship.
    pub async fn unfriend(&self, identity: &str, friend: &str) -> SocialResult<()> {
        let is_friend = self
            .store
            .request_between(identity, friend)
            .await?
            .map(|record| record.status == FriendRequestStatus::Accepted)
            .unwrap_or(false);
        if !is_friend {
            return Err(SocialError::NotFriends);
        }

        self.store.delete_between(identity, friend).await?;
        self.metrics.friend_requests.with_label_values(&["unfriended"]).inc();
        info!("{} removed {} from friends", identity, friend);
        Ok(())
    }

    /// Relationship status of `other` as seen by `viewer`. Blocks in either
    /// direction take precedence over any request record.
    pub async fn status(&self, viewer: &str, other: &str) -> SocialResult<FriendStatus> {
        if self.store.is_blocked(viewer, other).await? {
            return Ok(FriendStatus::Blocked);
        }

        Ok(self
            .store
            .request_between(viewer, other)
            .await?
            .map(|record| record.status_for(viewer))
            .unwrap_or(FriendStatus::None))
    }

    pub async fn is_friend(&self, a: &str, b: &str) -> SocialResult<bool> {
        Ok(self.status(a, b).await? == FriendStatus::Accepted)
    }

    /// Friends of `identity`, most recently befriended first.
    pub async fn list_friends(&self, identity: &str) -> SocialResult<Vec<Friend>> {
        let records = self.store.accepted_for(identity).await?;
        let ids: Vec<String> = records
            .iter()
            .map(|record| record.counterpart(identity).to_string())
            .collect();
        let summaries = self.directory.summaries(&ids).await?;

        Ok(records
            .into_iter()
            .zip(summaries)
            .map(|(record, identity)| Friend {
                identity,
                since: record.updated_at,
            })
            .collect())
    }

    /// Incoming pending requests, newest first.
    pub async fn pending_requests(&self, identity: &str) -> SocialResult<Vec<PendingRequest>> {
        let records = self.store.incoming_pending(identity).await?;
        let ids: Vec<String> = records.iter().map(|record| record.requester_id.clone()).collect();
        let summaries = self.directory.summaries(&ids).await?;

        Ok(records
            .into_iter()
            .zip(summaries)
            .map(|(request, requester)| PendingRequest { request, requester })
            .collect())
    }

    /// Profiles matching `query`, never the searcher nor anyone blocked in
    /// either direction with them.
    pub async fn search_identities(
        &self,
        query: &str,
        excluding: &str,
        limit: i64,
    ) -> SocialResult<Vec<IdentityMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SocialError::InvalidInput("search query is required"));
        }
        if limit <= 0 {
            return Err(SocialError::InvalidInput("limit must be positive"));
        }

        let profiles = self.directory.search(query, excluding, limit).await?;
        let mut matches = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let status = self.status(excluding, &profile.identity_id).await?;
            matches.push(IdentityMatch {
                identity: profile.into(),
                status,
            });
        }
        debug!("Search {:?} by {} matched {} identities", query, excluding, matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio_test::{assert_err, assert_ok};

    fn graph() -> (FriendGraph, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let metrics = SocialMetrics::new().unwrap();
        let directory = IdentityDirectory::new(store.clone());
        (FriendGraph::new(store.clone(), directory, metrics), store)
    }

    #[tokio::test]
    async fn request_to_self_is_rejected() {
        let (graph, _) = graph();
        let err = assert_err!(graph.send_request("alice", "alice").await);
        assert!(matches!(err, SocialError::SelfReference));
    }

    #[tokio::test]
    async fn duplicate_requests_in_either_direction_fail() {
        let (graph, _) = graph();
        assert_ok!(graph.send_request("alice", "bob").await);

        let err = assert_err!(graph.send_request("bob", "alice").await);
        assert!(matches!(err, SocialError::AlreadyPending));
        let err = assert_err!(graph.send_request("alice", "bob").await);
        assert!(matches!(err, SocialError::AlreadyPending));
    }

    #[tokio::test]
    async fn accepted_pair_cannot_request_again() {
        let (graph, _) = graph();
        let request = graph.send_request("alice", "bob").await.unwrap();
        graph.accept_request(request.id, "bob").await.unwrap();

        let err = assert_err!(graph.send_request("bob", "alice").await);
        assert!(matches!(err, SocialError::AlreadyFriends));
    }

    #[tokio::test]
    async fn only_the_receiver_may_accept_or_reject() {
        let (graph, _) = graph();
        let request = graph.send_request("alice", "bob").await.unwrap();

        let err = assert_err!(graph.accept_request(request.id, "alice").await);
        assert!(matches!(err, SocialError::Unauthorized));
        let err = assert_err!(graph.reject_request(request.id, "carol").await);
        assert!(matches!(err, SocialError::Unauthorized));
        let err = assert_err!(graph.accept_request(request.id + 100, "bob").await);
        assert!(matches!(err, SocialError::NotFound(_)));
    }

    #[tokio::test]
    async fn accepting_twice_reports_already_processed() {
        let (graph, _) = graph();
        let request = graph.send_request("alice", "bob").await.unwrap();
        assert_ok!(graph.accept_request(request.id, "bob").await);

        let err = assert_err!(graph.accept_request(request.id, "bob").await);
        assert!(matches!(err, SocialError::AlreadyProcessed));
    }

    #[tokio::test]
    async fn status_reads_per_side() {
        let (graph, _) = graph();
        assert_eq!(graph.status("alice", "bob").await.unwrap(), FriendStatus::None);

        let request = graph.send_request("alice", "bob").await.unwrap();
        assert_eq!(graph.status("alice", "bob").await.unwrap(), FriendStatus::Sent);
        assert_eq!(graph.status("bob", "alice").await.unwrap(), FriendStatus::Pending);

        graph.reject_request(request.id, "bob").await.unwrap();
        assert_eq!(graph.status("alice", "bob").await.unwrap(), FriendStatus::None);
    }

    #[tokio::test]
    async fn block_overrides_any_record() {
        let (graph, store) = graph();
        let request = graph.send_request("alice", "bob").await.unwrap();
        graph.accept_request(request.id, "bob").await.unwrap();
        store.block("bob", "alice").await.unwrap();

        assert_eq!(graph.status("alice", "bob").await.unwrap(), FriendStatus::Blocked);
        assert_eq!(graph.status("bob", "alice").await.unwrap(), FriendStatus::Blocked);
    }

    #[tokio::test]
    async fn unfriend_requires_an_accepted_record() {
        let (graph, _) = graph();
        let request = graph.send_request("alice", "bob").await.unwrap();

        let err = assert_err!(graph.unfriend("alice", "bob").await);
        assert!(matches!(err, SocialError::NotFriends));

        graph.accept_request(request.id, "bob").await.unwrap();
        assert_ok!(graph.unfriend("bob", "alice").await);
        assert!(graph.list_friends("alice").await.unwrap().is_empty());
        assert_eq!(graph.status("alice", "bob").await.unwrap(), FriendStatus::None);
    }

    #[tokio::test]
    async fn delete_relationship_ignores_status() {
        let (graph, _) = graph();
        graph.send_request("alice", "bob").await.unwrap();
        assert!(graph.delete_relationship("bob", "alice").await.unwrap());
        assert!(!graph.delete_relationship("bob", "alice").await.unwrap());
    }

    #[tokio::test]
    async fn pending_requests_are_newest_first() {
        let (graph, _) = graph();
        graph.send_request("alice", "carol").await.unwrap();
        graph.send_request("bob", "carol").await.unwrap();
        graph.send_request("carol", "dave").await.unwrap();

        let pending = graph.pending_requests("carol").await.unwrap();
        let requesters: Vec<_> = pending.iter().map(|p| p.requester.identity_id.as_str()).collect();
        assert_eq!(requesters, vec!["bob", "alice"]);
    }

    #[tokio::test]
    async fn search_skips_self_and_blocked_identities() {
        let (graph, store) = graph();
        graph.directory.register("alice", "ann_a", None).await.unwrap();
        graph.directory.register("bob", "ann_b", None).await.unwrap();
        graph.directory.register("carol", "ann_c", Some("Carol")).await.unwrap();
        graph.directory.register("dave", "dave", Some("Annie D")).await.unwrap();
        store.block("carol", "alice").await.unwrap();
        graph.send_request("alice", "bob").await.unwrap();

        let hits = graph.search_identities("ANN", "alice", 10).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|m| m.identity.identity_id.as_str()).collect();
        // ordered by handle: ann_b, dave
        assert_eq!(ids, vec!["bob", "dave"]);
        assert_eq!(hits[0].status, FriendStatus::Sent);

        let limited = graph.search_identities("ann", "alice", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        let err = assert_err!(graph.search_identities("  ", "alice", 10).await);
        assert!(matches!(err, SocialError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn search_refuses_non_positive_limits() {
        let (graph, _) = graph();
        graph.directory.register("bob", "ann_b", None).await.unwrap();

        for limit in [0, -1] {
            let err = assert_err!(graph.search_identities("ann", "alice", limit).await);
            assert!(matches!(err, SocialError::InvalidInput("limit must be positive")));
        }
    }
}
