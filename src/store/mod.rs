// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

//! Storage ports for the social core.
//!
//! Every method is atomic with respect to the invariants it touches: a
//! backend either enforces uniqueness with an index and a transaction
//! ([`PgStore`]) or serializes all calls ([`MemoryStore`]). Unique-key
//! collisions surface as [`StoreError::Conflict`](crate::error::StoreError).

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::blocking::{BlockOutcome, BlockRelation};
use crate::models::edit_history::{EditHistory, EntityKind, NewEditHistory};
use crate::models::friendship::{FriendRequest, NewFriendRequest};
use crate::models::messaging::{Conversation, Message, NewMessage};
use crate::models::profile::{CanonicalPair, NewProfile, Profile};
use crate::models::reaction::{ReactionKind, ReactionOutcome};

/// Friend-request and block records.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn request_by_id(&self, id: i32) -> StoreResult<Option<FriendRequest>>;

    /// The record for the unordered pair, in whichever direction it was sent.
    async fn request_between(&self, a: &str, b: &str) -> StoreResult<Option<FriendRequest>>;

    /// Insert a pending request. When `replacing` names a rejected record it
    /// is deleted in the same transaction before the insert.
    async fn insert_request(
        &self,
        request: NewFriendRequest,
        replacing: Option<i32>,
    ) -> StoreResult<FriendRequest>;

    /// Move a pending request to accepted. Returns `None` when the request is
    /// no longer pending.
    async fn accept_pending(&self, id: i32) -> StoreResult<Option<FriendRequest>>;

    async fn reject(&self, id: i32) -> StoreResult<Option<FriendRequest>>;

    /// Delete the pair's record regardless of status.
    async fn delete_between(&self, a: &str, b: &str) -> StoreResult<bool>;

    /// Accepted records touching `identity`, most recently updated first.
    async fn accepted_for(&self, identity: &str) -> StoreResult<Vec<FriendRequest>>;

    /// Pending records addressed to `identity`, newest first.
    async fn incoming_pending(&self, identity: &str) -> StoreResult<Vec<FriendRequest>>;

    /// Delete any friend-request record for the pair and insert the
    /// directional block, in one transaction.
    async fn block(&self, blocker: &str, blocked: &str) -> StoreResult<BlockOutcome>;

    async fn unblock(&self, blocker: &str, blocked: &str) -> StoreResult<bool>;

    /// Whether a block exists in either direction.
    async fn is_blocked(&self, a: &str, b: &str) -> StoreResult<bool>;

    /// Outgoing blocks of `blocker`, newest first.
    async fn blocks_by(&self, blocker: &str) -> StoreResult<Vec<BlockRelation>>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn conversation(&self, id: i32) -> StoreResult<Option<Conversation>>;

    async fn conversation_for_pair(&self, pair: &CanonicalPair) -> StoreResult<Option<Conversation>>;

    /// Insert the pair's conversation unless one exists, then return the
    /// stored row. Concurrent callers all get the same row.
    async fn get_or_insert_conversation(&self, pair: &CanonicalPair) -> StoreResult<Conversation>;

    /// Conversations of `identity` ordered by last activity.
    async fn conversations_for(&self, identity: &str) -> StoreResult<Vec<Conversation>>;

    /// Append a message and advance the conversation's `updated_at`.
    async fn append_message(&self, message: NewMessage) -> StoreResult<Message>;

    /// A page of messages, newest first.
    async fn messages(&self, conversation_id: i32, limit: i64, offset: i64) -> StoreResult<Vec<Message>>;

    async fn unread_count(&self, conversation_id: i32, viewer: &str) -> StoreResult<i64>;

    /// Flip every unread message not sent by `viewer`. Returns the number
    /// flipped.
    async fn mark_read(&self, conversation_id: i32, viewer: &str) -> StoreResult<usize>;
}

#[async_trait]
pub trait ReactionStore: Send + Sync {
    /// Apply [`next_state`](crate::models::reaction::next_state) to the
    /// caller's current reaction atomically.
    async fn toggle_reaction(
        &self,
        post_id: &str,
        identity: &str,
        kind: ReactionKind,
    ) -> StoreResult<ReactionOutcome>;

    async fn reaction_of(&self, post_id: &str, identity: &str) -> StoreResult<Option<ReactionKind>>;

    async fn reaction_counts(&self, post_id: &str) -> StoreResult<BTreeMap<ReactionKind, i64>>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append_history(&self, entry: NewEditHistory) -> StoreResult<EditHistory>;

    /// Entries for one entity, newest first.
    async fn history(&self, kind: EntityKind, entity_id: &str) -> StoreResult<Vec<EditHistory>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or update the identity's profile. A handle held by another
    /// identity is a conflict.
    async fn upsert_profile(&self, profile: NewProfile) -> StoreResult<Profile>;

    async fn profile(&self, identity: &str) -> StoreResult<Option<Profile>>;

    async fn profiles(&self, identities: &[String]) -> StoreResult<Vec<Profile>>;

    /// Profiles matching `query`, never `viewer` nor anyone blocked in either
    /// direction with `viewer`, at most `limit`.
    async fn search_profiles(&self, query: &str, viewer: &str, limit: i64) -> StoreResult<Vec<Profile>>;
}

/// A backend implementing every storage port.
#[async_trait]
pub trait Store: RelationshipStore + ConversationStore + ReactionStore + HistoryStore + ProfileStore {
    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;
}
