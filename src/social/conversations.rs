// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::{debug, info};

use super::directory::IdentityDirectory;
use super::friend_graph::FriendGraph;
use crate::error::{SocialError, SocialResult};
use crate::models::friendship::FriendStatus;
use crate::models::messaging::{Conversation, ConversationDetail};
use crate::models::profile::CanonicalPair;
use crate::store::ConversationStore;

/// Resolves the one conversation belonging to an unordered pair of friends.
#[derive(Clone)]
pub struct ConversationResolver {
    store: Arc<dyn ConversationStore>,
    friends: FriendGraph,
    directory: IdentityDirectory,
}

impl ConversationResolver {
    pub fn new(store: Arc<dyn ConversationStore>, friends: FriendGraph, directory: IdentityDirectory) -> Self {
        Self {
            store,
            friends,
            directory,
        }
    }

    /// Fetch or create the pair's conversation. Both sides must be friends
    /// with no block between them.
    pub async fn get_or_create(&self, caller: &str, other: &str) -> SocialResult<ConversationDetail> {
        let pair = CanonicalPair::new(caller, other).ok_or(SocialError::SelfReference)?;

        match self.friends.status(caller, other).await? {
            FriendStatus::Blocked => return Err(SocialError::Blocked),
            FriendStatus::Accepted => {}
            _ => return Err(SocialError::NotFriends),
        }

        let conversation = match self.store.conversation_for_pair(&pair).await? {
            Some(existing) => existing,
            None => {
                let created = self.store.get_or_insert_conversation(&pair).await?;
                info!("Opened conversation {} between {} and {}", created.id, pair.low(), pair.high());
                created
            }
        };

        self.detail(conversation).await
    }

    /// A conversation `viewer` participates in.
    pub async fn conversation_for(&self, conversation_id: i32, viewer: &str) -> SocialResult<Conversation> {
        let conversation = self
            .store
            .conversation(conversation_id)
            .await?
            .ok_or(SocialError::NotFound("conversation"))?;

        if !conversation.has_participant(viewer) {
            debug!("{} is not a participant of conversation {}", viewer, conversation_id);
            return Err(SocialError::Unauthorized);
        }
        Ok(conversation)
    }

    async fn detail(&self, conversation: Conversation) -> SocialResult<ConversationDetail> {
        let ids = [conversation.participant_low.clone(), conversation.participant_high.clone()];
        let mut summaries = self.directory.summaries(&ids).await?.into_iter();
        let low = summaries.next().ok_or(SocialError::NotFound("participant"))?;
        let high = summaries.next().ok_or(SocialError::NotFound("participant"))?;

        Ok(ConversationDetail {
            conversation,
            participants: [low, high],
        })
    }
}
