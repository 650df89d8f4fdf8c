// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};

use super::{text_column_enum, UnknownVariant};
use crate::schema::edit_history;

/// Kind of content whose edits are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize, Deserialize)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Post,
    Comment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
        }
    }
}

impl FromStr for EntityKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(EntityKind::Post),
            "comment" => Ok(EntityKind::Comment),
            other => Err(UnknownVariant { kind: "entity kind", value: other.to_string() }),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column_enum!(EntityKind);

/// One recorded content transition. Rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = edit_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EditHistory {
    pub id: i32,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub old_content: String,
    pub new_content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = edit_history)]
pub struct NewEditHistory {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub old_content: String,
    pub new_content: String,
    pub created_at: NaiveDateTime,
}
