// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::profile::{CanonicalPair, IdentitySummary};
use crate::schema::{conversations, messages};

/// The single conversation of an unordered identity pair.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Conversation {
    pub id: i32,
    pub participant_low: String,
    pub participant_high: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Conversation {
    pub fn has_participant(&self, identity: &str) -> bool {
        self.participant_low == identity || self.participant_high == identity
    }

    /// The participant that is not `identity`, or `None` if `identity` is not
    /// a participant.
    pub fn other_participant(&self, identity: &str) -> Option<&str> {
        if self.participant_low == identity {
            Some(&self.participant_high)
        } else if self.participant_high == identity {
            Some(&self.participant_low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub participant_low: String,
    pub participant_high: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewConversation {
    pub fn for_pair(pair: &CanonicalPair, now: NaiveDateTime) -> Self {
        Self {
            participant_low: pair.low().to_string(),
            participant_high: pair.high().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Message {
    pub id: i32,
    pub conversation_id: i32,
    pub sender_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: i32,
    pub sender_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Conversation with display data for both participants.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participants: [IdentitySummary; 2],
}

/// A conversation as listed for one of its participants.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub other_participant: IdentitySummary,
    pub unread_count: i64,
}

/// A message with its sender's display data.
#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: Message,
    pub sender: IdentitySummary,
}
