// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::api::identity::CallerIdentity;
use crate::api::routes::{ok, ApiResult};
use crate::api::AppState;
use crate::models::reaction::{ReactionOutcome, ReactionSummary};

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub kind: String,
}

/// Counts per kind plus the caller's own reaction
pub async fn get_reactions(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(post_id): Path<String>,
) -> ApiResult<ReactionSummary> {
    ok(state.core.reactions().summary(&post_id, caller.as_str()).await?)
}

pub async fn react(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(post_id): Path<String>,
    Json(body): Json<ReactRequest>,
) -> ApiResult<ReactionOutcome> {
    ok(state.core.reactions().react(&post_id, caller.as_str(), &body.kind).await?)
}
