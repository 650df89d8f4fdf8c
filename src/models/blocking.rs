// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use super::profile::IdentitySummary;
use crate::schema::profile_blocks;

/// Directional block: `blocker_id` blocks `blocked_id`
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = profile_blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlockRelation {
    pub id: i32,
    pub blocker_id: String,
    pub blocked_id: String,
    pub created_at: NaiveDateTime,
}

impl BlockRelation {
    /// True when this record blocks either side of the pair.
    pub fn covers(&self, a: &str, b: &str) -> bool {
        (self.blocker_id == a && self.blocked_id == b) || (self.blocker_id == b && self.blocked_id == a)
    }
}

/// DTO for inserting a new block
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profile_blocks)]
pub struct NewBlock {
    pub blocker_id: String,
    pub blocked_id: String,
    pub created_at: NaiveDateTime,
}

/// Result of a block call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BlockOutcome {
    /// A friend-request record for the pair existed and was removed.
    pub severed: bool,
    /// No block in this direction existed before the call.
    pub created: bool,
}

/// An outgoing block as listed for the blocker.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedIdentity {
    pub identity: IdentitySummary,
    pub blocked_at: NaiveDateTime,
}
