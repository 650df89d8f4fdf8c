// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Text};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl, SimpleAsyncConnection};
use tracing::debug;

use super::{ConversationStore, HistoryStore, ProfileStore, ReactionStore, RelationshipStore, Store};
use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::blocking::{BlockOutcome, BlockRelation, NewBlock};
use crate::models::edit_history::{EditHistory, EntityKind, NewEditHistory};
use crate::models::friendship::{FriendRequest, FriendRequestStatus, NewFriendRequest};
use crate::models::messaging::{Conversation, Message, NewConversation, NewMessage};
use crate::models::profile::{CanonicalPair, NewProfile, Profile};
use crate::models::reaction::{next_state, NewPostReaction, ReactionKind, ReactionOutcome};
use crate::schema::{conversations, edit_history, friend_requests, messages, post_reactions, profile_blocks, profiles};

/// PostgreSQL backend over the shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    db: Database,
    reaction_retry_attempts: u32,
}

impl PgStore {
    pub fn new(db: Database, reaction_retry_attempts: u32) -> Self {
        Self {
            db,
            reaction_retry_attempts: reaction_retry_attempts.max(1),
        }
    }

    /// One read-decide-write pass over a single reaction row, serialized per
    /// (post, identity) by a transaction-scoped advisory lock. The lock exists
    /// whether or not the row does.
    async fn toggle_once(
        &self,
        post_id: &str,
        identity: &str,
        requested: ReactionKind,
    ) -> StoreResult<ReactionOutcome> {
        let mut conn = self.db.get_connection().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                    .bind::<Text, _>(reaction_lock_key(post_id, identity))
                    .execute(conn)
                    .await?;

                let existing = post_reactions::table
                    .find((post_id, identity))
                    .select(post_reactions::kind)
                    .for_update()
                    .first::<ReactionKind>(conn)
                    .await
                    .optional()?;

                let outcome = next_state(existing, requested);
                let at = now();
                match outcome {
                    ReactionOutcome::Added { kind } => {
                        diesel::insert_into(post_reactions::table)
                            .values(&NewPostReaction {
                                post_id: post_id.to_string(),
                                identity_id: identity.to_string(),
                                kind,
                                created_at: at,
                                updated_at: at,
                            })
                            .execute(conn)
                            .await?;
                    }
                    ReactionOutcome::Removed { .. } => {
                        diesel::delete(post_reactions::table.find((post_id, identity)))
                            .execute(conn)
                            .await?;
                    }
                    ReactionOutcome::Changed { to, .. } => {
                        diesel::update(post_reactions::table.find((post_id, identity)))
                            .set((post_reactions::kind.eq(to), post_reactions::updated_at.eq(at)))
                            .execute(conn)
                            .await?;
                    }
                    ReactionOutcome::Ignored => {}
                }
                Ok(outcome)
            }
            .scope_boxed()
        })
        .await
    }
}

/// Advisory lock key for one caller's reaction on one post.
fn reaction_lock_key(post_id: &str, identity: &str) -> String {
    format!("post_reactions:{post_id}:{identity}")
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

type RequestPredicate = Box<dyn BoxableExpression<friend_requests::table, Pg, SqlType = Bool>>;

/// Matches the pair's record in either direction.
fn request_pair(a: &str, b: &str) -> RequestPredicate {
    use crate::schema::friend_requests::dsl::{receiver_id, requester_id};

    Box::new(
        requester_id
            .eq(a.to_owned())
            .and(receiver_id.eq(b.to_owned()))
            .or(requester_id.eq(b.to_owned()).and(receiver_id.eq(a.to_owned()))),
    )
}

/// Escape LIKE metacharacters so user input only matches literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl RelationshipStore for PgStore {
    async fn request_by_id(&self, id: i32) -> StoreResult<Option<FriendRequest>> {
        let mut conn = self.db.get_connection().await?;
        let found = friend_requests::table
            .find(id)
            .select(FriendRequest::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn request_between(&self, a: &str, b: &str) -> StoreResult<Option<FriendRequest>> {
        let mut conn = self.db.get_connection().await?;
        let found = friend_requests::table
            .filter(request_pair(a, b))
            .select(FriendRequest::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn insert_request(
        &self,
        request: NewFriendRequest,
        replacing: Option<i32>,
    ) -> StoreResult<FriendRequest> {
        let mut conn = self.db.get_connection().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                if let Some(id) = replacing {
                    diesel::delete(
                        friend_requests::table
                            .filter(friend_requests::id.eq(id))
                            .filter(friend_requests::status.eq(FriendRequestStatus::Rejected)),
                    )
                    .execute(conn)
                    .await?;
                }

                let stored = diesel::insert_into(friend_requests::table)
                    .values(&request)
                    .returning(FriendRequest::as_returning())
                    .get_result(conn)
                    .await?;
                Ok(stored)
            }
            .scope_boxed()
        })
        .await
    }

    async fn accept_pending(&self, id: i32) -> StoreResult<Option<FriendRequest>> {
        let mut conn = self.db.get_connection().await?;
        let accepted = diesel::update(
            friend_requests::table
                .filter(friend_requests::id.eq(id))
                .filter(friend_requests::status.eq(FriendRequestStatus::Pending)),
        )
        .set((
            friend_requests::status.eq(FriendRequestStatus::Accepted),
            friend_requests::updated_at.eq(now()),
        ))
        .returning(FriendRequest::as_returning())
        .get_result(&mut conn)
        .await
        .optional()?;
        Ok(accepted)
    }

    async fn reject(&self, id: i32) -> StoreResult<Option<FriendRequest>> {
        let mut conn = self.db.get_connection().await?;
        let rejected = diesel::update(friend_requests::table.filter(friend_requests::id.eq(id)))
            .set((
                friend_requests::status.eq(FriendRequestStatus::Rejected),
                friend_requests::updated_at.eq(now()),
            ))
            .returning(FriendRequest::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(rejected)
    }

    async fn delete_between(&self, a: &str, b: &str) -> StoreResult<bool> {
        let mut conn = self.db.get_connection().await?;
        let deleted = diesel::delete(friend_requests::table.filter(request_pair(a, b)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn accepted_for(&self, identity: &str) -> StoreResult<Vec<FriendRequest>> {
        let mut conn = self.db.get_connection().await?;
        let accepted = friend_requests::table
            .filter(friend_requests::status.eq(FriendRequestStatus::Accepted))
            .filter(
                friend_requests::requester_id
                    .eq(identity)
                    .or(friend_requests::receiver_id.eq(identity)),
            )
            .order((friend_requests::updated_at.desc(), friend_requests::id.desc()))
            .select(FriendRequest::as_select())
            .load(&mut conn)
            .await?;
        Ok(accepted)
    }

    async fn incoming_pending(&self, identity: &str) -> StoreResult<Vec<FriendRequest>> {
        let mut conn = self.db.get_connection().await?;
        let pending = friend_requests::table
            .filter(friend_requests::receiver_id.eq(identity))
            .filter(friend_requests::status.eq(FriendRequestStatus::Pending))
            .order((friend_requests::created_at.desc(), friend_requests::id.desc()))
            .select(FriendRequest::as_select())
            .load(&mut conn)
            .await?;
        Ok(pending)
    }

    async fn block(&self, blocker: &str, blocked: &str) -> StoreResult<BlockOutcome> {
        let mut conn = self.db.get_connection().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let severed = diesel::delete(friend_requests::table.filter(request_pair(blocker, blocked)))
                    .execute(conn)
                    .await?
                    > 0;

                let created = diesel::insert_into(profile_blocks::table)
                    .values(&NewBlock {
                        blocker_id: blocker.to_string(),
                        blocked_id: blocked.to_string(),
                        created_at: now(),
                    })
                    .on_conflict((profile_blocks::blocker_id, profile_blocks::blocked_id))
                    .do_nothing()
                    .execute(conn)
                    .await?
                    > 0;

                Ok(BlockOutcome { severed, created })
            }
            .scope_boxed()
        })
        .await
    }

    async fn unblock(&self, blocker: &str, blocked: &str) -> StoreResult<bool> {
        let mut conn = self.db.get_connection().await?;
        let deleted = diesel::delete(
            profile_blocks::table
                .filter(profile_blocks::blocker_id.eq(blocker))
                .filter(profile_blocks::blocked_id.eq(blocked)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }

    async fn is_blocked(&self, a: &str, b: &str) -> StoreResult<bool> {
        let mut conn = self.db.get_connection().await?;
        let blocked = diesel::select(diesel::dsl::exists(
            profile_blocks::table.filter(
                profile_blocks::blocker_id
                    .eq(a)
                    .and(profile_blocks::blocked_id.eq(b))
                    .or(profile_blocks::blocker_id.eq(b).and(profile_blocks::blocked_id.eq(a))),
            ),
        ))
        .get_result::<bool>(&mut conn)
        .await?;
        Ok(blocked)
    }

    async fn blocks_by(&self, blocker: &str) -> StoreResult<Vec<BlockRelation>> {
        let mut conn = self.db.get_connection().await?;
        let blocks = profile_blocks::table
            .filter(profile_blocks::blocker_id.eq(blocker))
            .order((profile_blocks::created_at.desc(), profile_blocks::id.desc()))
            .select(BlockRelation::as_select())
            .load(&mut conn)
            .await?;
        Ok(blocks)
    }
}

#[async_trait]
impl ConversationStore for PgStore {
    async fn conversation(&self, id: i32) -> StoreResult<Option<Conversation>> {
        let mut conn = self.db.get_connection().await?;
        let found = conversations::table
            .find(id)
            .select(Conversation::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn conversation_for_pair(&self, pair: &CanonicalPair) -> StoreResult<Option<Conversation>> {
        let mut conn = self.db.get_connection().await?;
        let found = conversations::table
            .filter(conversations::participant_low.eq(pair.low()))
            .filter(conversations::participant_high.eq(pair.high()))
            .select(Conversation::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn get_or_insert_conversation(&self, pair: &CanonicalPair) -> StoreResult<Conversation> {
        let mut conn = self.db.get_connection().await?;

        let inserted = diesel::insert_into(conversations::table)
            .values(&NewConversation::for_pair(pair, now()))
            .on_conflict((conversations::participant_low, conversations::participant_high))
            .do_nothing()
            .execute(&mut conn)
            .await?;
        if inserted == 0 {
            debug!("Conversation for {}/{} already existed", pair.low(), pair.high());
        }

        conversations::table
            .filter(conversations::participant_low.eq(pair.low()))
            .filter(conversations::participant_high.eq(pair.high()))
            .select(Conversation::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| StoreError::Unavailable(format!("conversation {}/{}", pair.low(), pair.high())))
    }

    async fn conversations_for(&self, identity: &str) -> StoreResult<Vec<Conversation>> {
        let mut conn = self.db.get_connection().await?;
        let found = conversations::table
            .filter(
                conversations::participant_low
                    .eq(identity)
                    .or(conversations::participant_high.eq(identity)),
            )
            .order((conversations::updated_at.desc(), conversations::id.desc()))
            .select(Conversation::as_select())
            .load(&mut conn)
            .await?;
        Ok(found)
    }

    async fn append_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut conn = self.db.get_connection().await?;
        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                let stored = diesel::insert_into(messages::table)
                    .values(&message)
                    .returning(Message::as_returning())
                    .get_result(conn)
                    .await?;

                diesel::update(conversations::table.find(stored.conversation_id))
                    .set(conversations::updated_at.eq(stored.created_at))
                    .execute(conn)
                    .await?;

                Ok(stored)
            }
            .scope_boxed()
        })
        .await
    }

    async fn messages(&self, conversation_id: i32, limit: i64, offset: i64) -> StoreResult<Vec<Message>> {
        let mut conn = self.db.get_connection().await?;
        let page = messages::table
            .filter(messages::conversation_id.eq(conversation_id))
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(limit)
            .offset(offset)
            .select(Message::as_select())
            .load(&mut conn)
            .await?;
        Ok(page)
    }

    async fn unread_count(&self, conversation_id: i32, viewer: &str) -> StoreResult<i64> {
        let mut conn = self.db.get_connection().await?;
        let count = messages::table
            .filter(messages::conversation_id.eq(conversation_id))
            .filter(messages::sender_id.ne(viewer))
            .filter(messages::is_read.eq(false))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(count)
    }

    async fn mark_read(&self, conversation_id: i32, viewer: &str) -> StoreResult<usize> {
        let mut conn = self.db.get_connection().await?;
        let flipped = diesel::update(
            messages::table
                .filter(messages::conversation_id.eq(conversation_id))
                .filter(messages::sender_id.ne(viewer))
                .filter(messages::is_read.eq(false)),
        )
        .set(messages::is_read.eq(true))
        .execute(&mut conn)
        .await?;
        Ok(flipped)
    }
}

#[async_trait]
impl ReactionStore for PgStore {
    async fn toggle_reaction(
        &self,
        post_id: &str,
        identity: &str,
        kind: ReactionKind,
    ) -> StoreResult<ReactionOutcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.toggle_once(post_id, identity, kind).await {
                // Only writers outside the advisory lock can win the key first.
                Err(err) if err.is_conflict() && attempt < self.reaction_retry_attempts => {
                    debug!("Reaction toggle on {} by {} lost an insert race, retrying", post_id, identity);
                }
                other => return other,
            }
        }
    }

    async fn reaction_of(&self, post_id: &str, identity: &str) -> StoreResult<Option<ReactionKind>> {
        let mut conn = self.db.get_connection().await?;
        let kind = post_reactions::table
            .find((post_id, identity))
            .select(post_reactions::kind)
            .first::<ReactionKind>(&mut conn)
            .await
            .optional()?;
        Ok(kind)
    }

    async fn reaction_counts(&self, post_id: &str) -> StoreResult<BTreeMap<ReactionKind, i64>> {
        let mut conn = self.db.get_connection().await?;
        let rows = post_reactions::table
            .filter(post_reactions::post_id.eq(post_id))
            .group_by(post_reactions::kind)
            .select((post_reactions::kind, diesel::dsl::count_star()))
            .load::<(ReactionKind, i64)>(&mut conn)
            .await?;
        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn append_history(&self, entry: NewEditHistory) -> StoreResult<EditHistory> {
        let mut conn = self.db.get_connection().await?;
        let stored = diesel::insert_into(edit_history::table)
            .values(&entry)
            .returning(EditHistory::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(stored)
    }

    async fn history(&self, kind: EntityKind, entity_id: &str) -> StoreResult<Vec<EditHistory>> {
        let mut conn = self.db.get_connection().await?;
        let entries = edit_history::table
            .filter(edit_history::entity_kind.eq(kind))
            .filter(edit_history::entity_id.eq(entity_id))
            .order((edit_history::created_at.desc(), edit_history::id.desc()))
            .select(EditHistory::as_select())
            .load(&mut conn)
            .await?;
        Ok(entries)
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn upsert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let mut conn = self.db.get_connection().await?;
        let stored = diesel::insert_into(profiles::table)
            .values(&profile)
            .on_conflict(profiles::identity_id)
            .do_update()
            .set((
                profiles::handle.eq(&profile.handle),
                profiles::display_name.eq(&profile.display_name),
                profiles::updated_at.eq(profile.updated_at),
            ))
            .returning(Profile::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(stored)
    }

    async fn profile(&self, identity: &str) -> StoreResult<Option<Profile>> {
        let mut conn = self.db.get_connection().await?;
        let found = profiles::table
            .find(identity)
            .select(Profile::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(found)
    }

    async fn profiles(&self, identities: &[String]) -> StoreResult<Vec<Profile>> {
        if identities.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.db.get_connection().await?;
        let found = profiles::table
            .filter(profiles::identity_id.eq_any(identities))
            .select(Profile::as_select())
            .load(&mut conn)
            .await?;
        Ok(found)
    }

    async fn search_profiles(&self, query: &str, viewer: &str, limit: i64) -> StoreResult<Vec<Profile>> {
        let mut conn = self.db.get_connection().await?;
        let pattern = like_pattern(query);

        let blocked_by_viewer = profile_blocks::table
            .filter(profile_blocks::blocker_id.eq(viewer))
            .select(profile_blocks::blocked_id);
        let blocking_viewer = profile_blocks::table
            .filter(profile_blocks::blocked_id.eq(viewer))
            .select(profile_blocks::blocker_id);

        let hits = profiles::table
            .filter(profiles::identity_id.ne(viewer))
            .filter(profiles::identity_id.ne_all(blocked_by_viewer))
            .filter(profiles::identity_id.ne_all(blocking_viewer))
            .filter(
                profiles::handle
                    .ilike(pattern.clone())
                    .or(profiles::display_name.ilike(pattern)),
            )
            .order(profiles::handle.asc())
            .limit(limit)
            .select(Profile::as_select())
            .load(&mut conn)
            .await?;
        Ok(hits)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.db.get_connection().await?;
        conn.batch_execute("SELECT 1").await?;
        Ok(())
    }
}
