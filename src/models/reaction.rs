// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};

use super::{text_column_enum, UnknownVariant};
use crate::schema::post_reactions;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsExpression, FromSqlRow, Serialize, Deserialize,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 6] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Haha,
        ReactionKind::Wow,
        ReactionKind::Sad,
        ReactionKind::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Haha => "haha",
            ReactionKind::Wow => "wow",
            ReactionKind::Sad => "sad",
            ReactionKind::Angry => "angry",
        }
    }
}

impl FromStr for ReactionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant { kind: "reaction kind", value: s.to_string() })
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

text_column_enum!(ReactionKind);

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = post_reactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostReaction {
    pub post_id: String,
    pub identity_id: String,
    pub kind: ReactionKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = post_reactions)]
pub struct NewPostReaction {
    pub post_id: String,
    pub identity_id: String,
    pub kind: ReactionKind,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// What a toggle did to the caller's reaction on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ReactionOutcome {
    Added { kind: ReactionKind },
    Removed { kind: ReactionKind },
    Changed { from: ReactionKind, to: ReactionKind },
    /// The requested kind was not recognized; nothing was written.
    Ignored,
}

impl ReactionOutcome {
    /// The reaction held by the caller after the toggle.
    pub fn current(&self) -> Option<ReactionKind> {
        match self {
            ReactionOutcome::Added { kind } => Some(*kind),
            ReactionOutcome::Changed { to, .. } => Some(*to),
            ReactionOutcome::Removed { .. } | ReactionOutcome::Ignored => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReactionOutcome::Added { .. } => "added",
            ReactionOutcome::Removed { .. } => "removed",
            ReactionOutcome::Changed { .. } => "changed",
            ReactionOutcome::Ignored => "ignored",
        }
    }
}

/// Reaction totals for a post plus the viewer's own reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionSummary {
    pub counts: BTreeMap<ReactionKind, i64>,
    pub mine: Option<ReactionKind>,
}

/// Toggle transition: no reaction creates, the same kind retracts, a
/// different kind overwrites.
pub fn next_state(existing: Option<ReactionKind>, requested: ReactionKind) -> ReactionOutcome {
    match existing {
        None => ReactionOutcome::Added { kind: requested },
        Some(current) if current == requested => ReactionOutcome::Removed { kind: current },
        Some(current) => ReactionOutcome::Changed { from: current, to: requested },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_transitions() {
        assert_eq!(
            next_state(None, ReactionKind::Like),
            ReactionOutcome::Added { kind: ReactionKind::Like }
        );
        assert_eq!(
            next_state(Some(ReactionKind::Like), ReactionKind::Like),
            ReactionOutcome::Removed { kind: ReactionKind::Like }
        );
        assert_eq!(
            next_state(Some(ReactionKind::Like), ReactionKind::Love),
            ReactionOutcome::Changed { from: ReactionKind::Like, to: ReactionKind::Love }
        );
    }

    #[test]
    fn applying_same_kind_twice_leaves_nothing() {
        for kind in ReactionKind::ALL {
            let first = next_state(None, kind);
            let second = next_state(first.current(), kind);
            assert_eq!(second.current(), None);
        }
    }

    #[test]
    fn unknown_kind_does_not_parse() {
        assert_eq!("wow".parse::<ReactionKind>().unwrap(), ReactionKind::Wow);
        assert!("meh".parse::<ReactionKind>().is_err());
        assert!("Like".parse::<ReactionKind>().is_err());
    }
}
