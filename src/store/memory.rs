// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::Mutex;

use super::{ConversationStore, HistoryStore, ProfileStore, ReactionStore, RelationshipStore, Store};
use crate::error::{StoreError, StoreResult};
use crate::models::blocking::{BlockOutcome, BlockRelation};
use crate::models::edit_history::{EditHistory, EntityKind, NewEditHistory};
use crate::models::friendship::{FriendRequest, FriendRequestStatus, NewFriendRequest};
use crate::models::messaging::{Conversation, Message, NewConversation, NewMessage};
use crate::models::profile::{CanonicalPair, NewProfile, Profile};
use crate::models::reaction::{next_state, PostReaction, ReactionKind, ReactionOutcome};

/// In-process backend.
///
/// All state sits behind one async mutex, so each trait method observes and
/// mutates a consistent snapshot. Uniqueness rules match the PostgreSQL
/// indexes and violations are reported as [`StoreError::Conflict`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<String, Profile>,
    requests: BTreeMap<i32, FriendRequest>,
    blocks: Vec<BlockRelation>,
    conversations: BTreeMap<i32, Conversation>,
    messages: Vec<Message>,
    reactions: BTreeMap<(String, String), PostReaction>,
    history: Vec<EditHistory>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn pair_request(&self, a: &str, b: &str) -> Option<&FriendRequest> {
        self.requests.values().find(|r| r.involves(a) && r.counterpart(a) == b)
    }

    fn blocked_either(&self, a: &str, b: &str) -> bool {
        self.blocks.iter().any(|block| block.covers(a, b))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn request_by_id(&self, id: i32) -> StoreResult<Option<FriendRequest>> {
        Ok(self.inner.lock().await.requests.get(&id).cloned())
    }

    async fn request_between(&self, a: &str, b: &str) -> StoreResult<Option<FriendRequest>> {
        Ok(self.inner.lock().await.pair_request(a, b).cloned())
    }

    async fn insert_request(
        &self,
        request: NewFriendRequest,
        replacing: Option<i32>,
    ) -> StoreResult<FriendRequest> {
        let mut tables = self.inner.lock().await;

        if let Some(id) = replacing {
            let is_rejected = tables
                .requests
                .get(&id)
                .map(|r| r.status == FriendRequestStatus::Rejected)
                .unwrap_or(false);
            if is_rejected {
                tables.requests.remove(&id);
            }
        }

        if tables.pair_request(&request.requester_id, &request.receiver_id).is_some() {
            return Err(StoreError::Conflict("friend_requests pair".into()));
        }

        let id = tables.next_id();
        let stored = FriendRequest {
            id,
            requester_id: request.requester_id,
            receiver_id: request.receiver_id,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        };
        tables.requests.insert(id, stored.clone());
        Ok(stored)
    }

    async fn accept_pending(&self, id: i32) -> StoreResult<Option<FriendRequest>> {
        let mut tables = self.inner.lock().await;
        match tables.requests.get_mut(&id) {
            Some(request) if request.status == FriendRequestStatus::Pending => {
                request.status = FriendRequestStatus::Accepted;
                request.updated_at = now();
                Ok(Some(request.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn reject(&self, id: i32) -> StoreResult<Option<FriendRequest>> {
        let mut tables = self.inner.lock().await;
        Ok(tables.requests.get_mut(&id).map(|request| {
            request.status = FriendRequestStatus::Rejected;
            request.updated_at = now();
            request.clone()
        }))
    }

    async fn delete_between(&self, a: &str, b: &str) -> StoreResult<bool> {
        let mut tables = self.inner.lock().await;
        let id = tables.pair_request(a, b).map(|r| r.id);
        Ok(id.and_then(|id| tables.requests.remove(&id)).is_some())
    }

    async fn accepted_for(&self, identity: &str) -> StoreResult<Vec<FriendRequest>> {
        let tables = self.inner.lock().await;
        let mut accepted: Vec<FriendRequest> = tables
            .requests
            .values()
            .filter(|r| r.status == FriendRequestStatus::Accepted && r.involves(identity))
            .cloned()
            .collect();
        accepted.sort_by(|x, y| (y.updated_at, y.id).cmp(&(x.updated_at, x.id)));
        Ok(accepted)
    }

    async fn incoming_pending(&self, identity: &str) -> StoreResult<Vec<FriendRequest>> {
        let tables = self.inner.lock().await;
        let mut pending: Vec<FriendRequest> = tables
            .requests
            .values()
            .filter(|r| r.status == FriendRequestStatus::Pending && r.receiver_id == identity)
            .cloned()
            .collect();
        pending.sort_by(|x, y| (y.created_at, y.id).cmp(&(x.created_at, x.id)));
        Ok(pending)
    }

    async fn block(&self, blocker: &str, blocked: &str) -> StoreResult<BlockOutcome> {
        let mut tables = self.inner.lock().await;

        let severed = match tables.pair_request(blocker, blocked).map(|r| r.id) {
            Some(id) => tables.requests.remove(&id).is_some(),
            None => false,
        };

        let exists = tables
            .blocks
            .iter()
            .any(|b| b.blocker_id == blocker && b.blocked_id == blocked);
        if !exists {
            let id = tables.next_id();
            tables.blocks.push(BlockRelation {
                id,
                blocker_id: blocker.to_string(),
                blocked_id: blocked.to_string(),
                created_at: now(),
            });
        }

        Ok(BlockOutcome { severed, created: !exists })
    }

    async fn unblock(&self, blocker: &str, blocked: &str) -> StoreResult<bool> {
        let mut tables = self.inner.lock().await;
        let before = tables.blocks.len();
        tables
            .blocks
            .retain(|b| !(b.blocker_id == blocker && b.blocked_id == blocked));
        Ok(tables.blocks.len() != before)
    }

    async fn is_blocked(&self, a: &str, b: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().await.blocked_either(a, b))
    }

    async fn blocks_by(&self, blocker: &str) -> StoreResult<Vec<BlockRelation>> {
        let tables = self.inner.lock().await;
        let mut blocks: Vec<BlockRelation> = tables
            .blocks
            .iter()
            .filter(|b| b.blocker_id == blocker)
            .cloned()
            .collect();
        blocks.sort_by(|x, y| (y.created_at, y.id).cmp(&(x.created_at, x.id)));
        Ok(blocks)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn conversation(&self, id: i32) -> StoreResult<Option<Conversation>> {
        Ok(self.inner.lock().await.conversations.get(&id).cloned())
    }

    async fn conversation_for_pair(&self, pair: &CanonicalPair) -> StoreResult<Option<Conversation>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .conversations
            .values()
            .find(|c| c.participant_low == pair.low() && c.participant_high == pair.high())
            .cloned())
    }

    async fn get_or_insert_conversation(&self, pair: &CanonicalPair) -> StoreResult<Conversation> {
        let mut tables = self.inner.lock().await;
        if let Some(existing) = tables
            .conversations
            .values()
            .find(|c| c.participant_low == pair.low() && c.participant_high == pair.high())
        {
            return Ok(existing.clone());
        }

        let row = NewConversation::for_pair(pair, now());
        let id = tables.next_id();
        let stored = Conversation {
            id,
            participant_low: row.participant_low,
            participant_high: row.participant_high,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        tables.conversations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn conversations_for(&self, identity: &str) -> StoreResult<Vec<Conversation>> {
        let tables = self.inner.lock().await;
        let mut found: Vec<Conversation> = tables
            .conversations
            .values()
            .filter(|c| c.has_participant(identity))
            .cloned()
            .collect();
        found.sort_by(|x, y| (y.updated_at, y.id).cmp(&(x.updated_at, x.id)));
        Ok(found)
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut tables = self.inner.lock().await;
        let id = tables.next_id();
        let conversation = tables
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| StoreError::Unavailable(format!("conversation {}", message.conversation_id)))?;
        conversation.updated_at = message.created_at;

        let stored = Message {
            id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            is_read: message.is_read,
            created_at: message.created_at,
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn messages(&self, conversation_id: i32, limit: i64, offset: i64) -> StoreResult<Vec<Message>> {
        let tables = self.inner.lock().await;
        let mut page: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        page.sort_by(|x, y| (y.created_at, y.id).cmp(&(x.created_at, x.id)));
        Ok(page
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn unread_count(&self, conversation_id: i32, viewer: &str) -> StoreResult<i64> {
        let tables = self.inner.lock().await;
        let count = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.sender_id != viewer && !m.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, conversation_id: i32, viewer: &str) -> StoreResult<usize> {
        let mut tables = self.inner.lock().await;
        let mut flipped = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.sender_id != viewer && !m.is_read)
        {
            message.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

#[async_trait]
impl ReactionStore for MemoryStore {
    async fn toggle_reaction(
        &self,
        post_id: &str,
        identity: &str,
        kind: ReactionKind,
    ) -> StoreResult<ReactionOutcome> {
        let mut tables = self.inner.lock().await;
        let key = (post_id.to_string(), identity.to_string());
        let outcome = next_state(tables.reactions.get(&key).map(|r| r.kind), kind);
        let at = now();

        match outcome {
            ReactionOutcome::Added { kind } => {
                tables.reactions.insert(
                    key,
                    PostReaction {
                        post_id: post_id.to_string(),
                        identity_id: identity.to_string(),
                        kind,
                        created_at: at,
                        updated_at: at,
                    },
                );
            }
            ReactionOutcome::Removed { .. } => {
                tables.reactions.remove(&key);
            }
            ReactionOutcome::Changed { to, .. } => {
                if let Some(reaction) = tables.reactions.get_mut(&key) {
                    reaction.kind = to;
                    reaction.updated_at = at;
                }
            }
            ReactionOutcome::Ignored => {}
        }

        Ok(outcome)
    }

    async fn reaction_of(&self, post_id: &str, identity: &str) -> StoreResult<Option<ReactionKind>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .reactions
            .get(&(post_id.to_string(), identity.to_string()))
            .map(|r| r.kind))
    }

    async fn reaction_counts(&self, post_id: &str) -> StoreResult<BTreeMap<ReactionKind, i64>> {
        let tables = self.inner.lock().await;
        let mut counts = BTreeMap::new();
        for reaction in tables.reactions.values().filter(|r| r.post_id == post_id) {
            *counts.entry(reaction.kind).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append_history(&self, entry: NewEditHistory) -> StoreResult<EditHistory> {
        let mut tables = self.inner.lock().await;
        let id = tables.next_id();
        let stored = EditHistory {
            id,
            entity_kind: entry.entity_kind,
            entity_id: entry.entity_id,
            old_content: entry.old_content,
            new_content: entry.new_content,
            created_at: entry.created_at,
        };
        tables.history.push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, kind: EntityKind, entity_id: &str) -> StoreResult<Vec<EditHistory>> {
        let tables = self.inner.lock().await;
        let mut entries: Vec<EditHistory> = tables
            .history
            .iter()
            .filter(|h| h.entity_kind == kind && h.entity_id == entity_id)
            .cloned()
            .collect();
        entries.sort_by(|x, y| (y.created_at, y.id).cmp(&(x.created_at, x.id)));
        Ok(entries)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn upsert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let mut tables = self.inner.lock().await;

        let handle_taken = tables.profiles.values().any(|p| {
            p.identity_id != profile.identity_id && p.handle.eq_ignore_ascii_case(&profile.handle)
        });
        if handle_taken {
            return Err(StoreError::Conflict("profiles handle".into()));
        }

        let stored = match tables.profiles.get_mut(&profile.identity_id) {
            Some(existing) => {
                existing.handle = profile.handle;
                existing.display_name = profile.display_name;
                existing.updated_at = profile.updated_at;
                existing.clone()
            }
            None => {
                let created = Profile {
                    identity_id: profile.identity_id.clone(),
                    handle: profile.handle,
                    display_name: profile.display_name,
                    created_at: profile.created_at,
                    updated_at: profile.updated_at,
                };
                tables.profiles.insert(profile.identity_id, created.clone());
                created
            }
        };
        Ok(stored)
    }

    async fn profile(&self, identity: &str) -> StoreResult<Option<Profile>> {
        Ok(self.inner.lock().await.profiles.get(identity).cloned())
    }

    async fn profiles(&self, identities: &[String]) -> StoreResult<Vec<Profile>> {
        let tables = self.inner.lock().await;
        Ok(identities
            .iter()
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect())
    }

    async fn search_profiles(&self, query: &str, viewer: &str, limit: i64) -> StoreResult<Vec<Profile>> {
        let tables = self.inner.lock().await;
        let mut hits: Vec<Profile> = tables
            .profiles
            .values()
            .filter(|p| p.identity_id != viewer)
            .filter(|p| !tables.blocked_either(viewer, &p.identity_id))
            .filter(|p| p.matches(query))
            .cloned()
            .collect();
        hits.sort_by(|x, y| x.handle.cmp(&y.handle));
        hits.truncate(limit.max(0) as usize);
        Ok(hits)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn pair_record_is_unique_in_both_directions() {
        let store = MemoryStore::new();
        let at = now();
        assert_ok!(store.insert_request(NewFriendRequest::pending("a", "b", at), None).await);
        let err = assert_err!(store.insert_request(NewFriendRequest::pending("b", "a", at), None).await);
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn replacing_only_removes_rejected_records() {
        let store = MemoryStore::new();
        let at = now();
        let first = store
            .insert_request(NewFriendRequest::pending("a", "b", at), None)
            .await
            .unwrap();

        // still pending, so the replacement must collide
        let err = assert_err!(
            store
                .insert_request(NewFriendRequest::pending("b", "a", at), Some(first.id))
                .await
        );
        assert!(err.is_conflict());

        store.reject(first.id).await.unwrap();
        let second = store
            .insert_request(NewFriendRequest::pending("b", "a", at), Some(first.id))
            .await
            .unwrap();
        assert_eq!(second.requester_id, "b");
        assert!(store.request_by_id(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn accept_only_moves_pending_records() {
        let store = MemoryStore::new();
        let request = store
            .insert_request(NewFriendRequest::pending("a", "b", now()), None)
            .await
            .unwrap();
        assert!(store.accept_pending(request.id).await.unwrap().is_some());
        assert!(store.accept_pending(request.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn handle_is_unique_ignoring_case() {
        let store = MemoryStore::new();
        let at = now();
        let profile = |id: &str, handle: &str| NewProfile {
            identity_id: id.into(),
            handle: handle.into(),
            display_name: None,
            created_at: at,
            updated_at: at,
        };
        assert_ok!(store.upsert_profile(profile("a", "Typist")).await);
        assert_ok!(store.upsert_profile(profile("a", "typist")).await);
        let err = assert_err!(store.upsert_profile(profile("b", "TYPIST")).await);
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn duplicate_block_is_not_recreated() {
        let store = MemoryStore::new();
        let first = store.block("a", "b").await.unwrap();
        let second = store.block("a", "b").await.unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(store.blocks_by("a").await.unwrap().len(), 1);
        assert!(store.is_blocked("b", "a").await.unwrap());
    }
}
