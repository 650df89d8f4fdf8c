// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};

use super::profile::IdentitySummary;
use super::{text_column_enum, UnknownVariant};
use crate::schema::friend_requests;

/// Lifecycle state of a friend request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
            FriendRequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for FriendRequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendRequestStatus::Pending),
            "accepted" => Ok(FriendRequestStatus::Accepted),
            "rejected" => Ok(FriendRequestStatus::Rejected),
            other => Err(UnknownVariant { kind: "friend request status", value: other.to_string() }),
        }
    }
}

impl fmt::Display for FriendRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column_enum!(FriendRequestStatus);

/// The single relationship record kept for an unordered pair of identities.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = friend_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FriendRequest {
    pub id: i32,
    pub requester_id: String,
    pub receiver_id: String,
    pub status: FriendRequestStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FriendRequest {
    pub fn involves(&self, identity: &str) -> bool {
        self.requester_id == identity || self.receiver_id == identity
    }

    /// The party on the other side of the record from `identity`.
    pub fn counterpart(&self, identity: &str) -> &str {
        if self.requester_id == identity {
            &self.receiver_id
        } else {
            &self.requester_id
        }
    }

    /// Relationship status as seen by `viewer`, ignoring blocks.
    pub fn status_for(&self, viewer: &str) -> FriendStatus {
        match self.status {
            FriendRequestStatus::Accepted => FriendStatus::Accepted,
            FriendRequestStatus::Rejected => FriendStatus::None,
            FriendRequestStatus::Pending if self.requester_id == viewer => FriendStatus::Sent,
            FriendRequestStatus::Pending => FriendStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = friend_requests)]
pub struct NewFriendRequest {
    pub requester_id: String,
    pub receiver_id: String,
    pub status: FriendRequestStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewFriendRequest {
    pub fn pending(requester_id: &str, receiver_id: &str, now: NaiveDateTime) -> Self {
        Self {
            requester_id: requester_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: FriendRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derived relationship status between a viewer and another identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Blocked,
    Accepted,
    Sent,
    Pending,
    None,
}

impl FriendStatus {
    /// The status the other party observes for the same record.
    pub fn mirrored(self) -> FriendStatus {
        match self {
            FriendStatus::Sent => FriendStatus::Pending,
            FriendStatus::Pending => FriendStatus::Sent,
            other => other,
        }
    }
}

/// An incoming pending request together with the requester's display data.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequest {
    pub request: FriendRequest,
    pub requester: IdentitySummary,
}

/// A friend as listed for an identity.
#[derive(Debug, Clone, Serialize)]
pub struct Friend {
    pub identity: IdentitySummary,
    pub since: NaiveDateTime,
}

/// A search hit with the searcher's relationship status towards it.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityMatch {
    #[serde(flatten)]
    pub identity: IdentitySummary,
    pub status: FriendStatus,
}
