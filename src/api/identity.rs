// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::routes::ApiError;

/// Header the authentication gateway sets to the verified caller.
pub const IDENTITY_HEADER: &str = "x-identity-id";

/// Verified caller identity taken from [`IDENTITY_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| CallerIdentity(value.to_string()))
            .ok_or(ApiError::Unauthenticated)
    }
}
