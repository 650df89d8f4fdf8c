// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info};

use super::directory::IdentityDirectory;
use crate::error::{SocialError, SocialResult};
use crate::metrics::SocialMetrics;
use crate::models::messaging::{ConversationSummary, MessageDetail, NewMessage};
use crate::store::{ConversationStore, RelationshipStore};

/// Send authorization, paging and unread tracking.
#[derive(Clone)]
pub struct Messenger {
    conversations: Arc<dyn ConversationStore>,
    relationships: Arc<dyn RelationshipStore>,
    directory: IdentityDirectory,
    metrics: SocialMetrics,
}

impl Messenger {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        relationships: Arc<dyn RelationshipStore>,
        directory: IdentityDirectory,
        metrics: SocialMetrics,
    ) -> Self {
        Self {
            conversations,
            relationships,
            directory,
            metrics,
        }
    }

    /// Append a message from `sender`. The block check runs at send time so
    /// a block placed after the conversation was opened still applies.
    pub async fn send(&self, conversation_id: i32, sender: &str, content: &str) -> SocialResult<MessageDetail> {
        if content.is_empty() {
            return Err(SocialError::EmptyContent);
        }

        let conversation = self
            .conversations
            .conversation(conversation_id)
            .await?
            .ok_or(SocialError::NotFound("conversation"))?;
        let receiver = conversation
            .other_participant(sender)
            .ok_or(SocialError::Unauthorized)?;

        if self.relationships.is_blocked(sender, receiver).await? {
            debug!("Message from {} to {} refused: blocked", sender, receiver);
            return Err(SocialError::Blocked);
        }

        let message = self
            .conversations
            .append_message(NewMessage {
                conversation_id,
                sender_id: sender.to_string(),
                content: content.to_string(),
                is_read: false,
                created_at: Utc::now().naive_utc(),
            })
            .await?;

        self.metrics.messages_sent.inc();
        info!("Message {} sent in conversation {} by {}", message.id, conversation_id, sender);

        let sender = self.directory.summary(sender).await?;
        Ok(MessageDetail { message, sender })
    }

    /// A page of messages, newest first.
    pub async fn list_messages(&self, conversation_id: i32, limit: i64, offset: i64) -> SocialResult<Vec<MessageDetail>> {
        if limit <= 0 {
            return Err(SocialError::InvalidInput("limit must be positive"));
        }
        if offset < 0 {
            return Err(SocialError::InvalidInput("offset must not be negative"));
        }

        let page = self.conversations.messages(conversation_id, limit, offset).await?;
        let ids: Vec<String> = page.iter().map(|m| m.sender_id.clone()).collect();
        let senders = self.directory.summaries(&ids).await?;

        Ok(page
            .into_iter()
            .zip(senders)
            .map(|(message, sender)| MessageDetail { message, sender })
            .collect())
    }

    /// Messages in the conversation not sent by `viewer` and not yet read.
    pub async fn unread_count(&self, viewer: &str, conversation_id: i32) -> SocialResult<i64> {
        Ok(self.conversations.unread_count(conversation_id, viewer).await?)
    }

    pub async fn mark_read(&self, conversation_id: i32, viewer: &str) -> SocialResult<usize> {
        let flipped = self.conversations.mark_read(conversation_id, viewer).await?;
        if flipped > 0 {
            debug!("{} read {} messages in conversation {}", viewer, flipped, conversation_id);
        }
        Ok(flipped)
    }

    /// Conversations of `identity` by last activity, each with the other
    /// participant and the identity's unread count.
    pub async fn list_conversations(&self, identity: &str) -> SocialResult<Vec<ConversationSummary>> {
        let conversations = self.conversations.conversations_for(identity).await?;

        let others: Vec<String> = conversations
            .iter()
            .map(|c| c.other_participant(identity).unwrap_or_default().to_string())
            .collect();
        let summaries = self.directory.summaries(&others).await?;
        let unread = try_join_all(
            conversations
                .iter()
                .map(|c| self.conversations.unread_count(c.id, identity)),
        )
        .await?;

        Ok(conversations
            .into_iter()
            .zip(summaries)
            .zip(unread)
            .map(|((conversation, other_participant), unread_count)| ConversationSummary {
                conversation,
                other_participant,
                unread_count,
            })
            .collect())
    }
}
