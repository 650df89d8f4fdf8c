// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failures raised by a storage backend.
///
/// These are the only errors a caller may retry: everything in
/// [`SocialError`] other than [`SocialError::Store`] is a definitive,
/// user-facing outcome.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// A unique constraint rejected the write.
    #[error("conflicting write: {0}")]
    Conflict(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(diesel::result::Error),

    /// A row that must exist at this point could not be read back.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Outcomes of the relationship and messaging engines.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("an identity cannot act on itself")]
    SelfReference,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("caller is not a party to this record")]
    Unauthorized,

    #[error("friend request already pending")]
    AlreadyPending,

    #[error("already friends")]
    AlreadyFriends,

    #[error("friend request already processed")]
    AlreadyProcessed,

    #[error("a block exists between these identities")]
    Blocked,

    #[error("identities must be friends")]
    NotFriends,

    #[error("message content cannot be empty")]
    EmptyContent,

    #[error("handle is already taken")]
    HandleTaken,

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SocialError {
    /// Whether the caller may retry the operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SocialError::Store(err) if !err.is_conflict())
    }
}

pub type SocialResult<T> = Result<T, SocialError>;
pub type StoreResult<T> = Result<T, StoreError>;
