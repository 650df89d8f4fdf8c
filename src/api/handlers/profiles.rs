// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::identity::CallerIdentity;
use crate::api::routes::{ok, ApiResult};
use crate::api::AppState;
use crate::models::friendship::IdentityMatch;
use crate::models::profile::Profile;

#[derive(Debug, Deserialize)]
pub struct RegisterProfileRequest {
    pub handle: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

/// Register or update the caller's profile
pub async fn register_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(body): Json<RegisterProfileRequest>,
) -> ApiResult<Profile> {
    let profile = state
        .core
        .directory()
        .register(caller.as_str(), &body.handle, body.display_name.as_deref())
        .await?;
    ok(profile)
}

/// Search identities by handle or display name
pub async fn search_users(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<IdentityMatch>> {
    let limit = state.limits.search_size(query.limit);
    let matches = state
        .core
        .friends()
        .search_identities(&query.q, caller.as_str(), limit)
        .await?;
    ok(matches)
}
