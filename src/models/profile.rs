// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use crate::schema::profiles;

/// Display data an identity registers for itself.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Profile {
    pub identity_id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Profile {
    /// Case-insensitive substring match over handle and display name.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.handle.to_lowercase().contains(&needle)
            || self
                .display_name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

/// DTO for registering or updating a profile
#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub identity_id: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Identity display data attached to friends, participants and senders.
///
/// Identities that never registered a profile still get a summary carrying
/// only their id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub identity_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
}

impl IdentitySummary {
    pub fn bare(identity_id: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            handle: None,
            display_name: None,
        }
    }
}

impl From<Profile> for IdentitySummary {
    fn from(profile: Profile) -> Self {
        Self {
            identity_id: profile.identity_id,
            handle: Some(profile.handle),
            display_name: profile.display_name,
        }
    }
}

/// Unordered identity pair normalized so the lexicographically smaller
/// identity comes first.
///
/// Used identically when looking up and when creating a conversation, so the
/// same two identities always land on the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPair {
    low: String,
    high: String,
}

impl CanonicalPair {
    /// Returns `None` when both sides are the same identity.
    pub fn new(a: &str, b: &str) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self { low: a.to_string(), high: b.to_string() }),
            std::cmp::Ordering::Greater => Some(Self { low: b.to_string(), high: a.to_string() }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.low == identity || self.high == identity
    }
}
