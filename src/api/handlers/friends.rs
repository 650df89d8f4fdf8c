// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::identity::CallerIdentity;
use crate::api::routes::{ok, ApiResult};
use crate::api::AppState;
use crate::models::friendship::{Friend, FriendRequest, FriendStatus, PendingRequest};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub identity_id: String,
    pub status: FriendStatus,
}

/// Send a friend request to `id`
pub async fn send_request(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<FriendRequest> {
    ok(state.core.friends().send_request(caller.as_str(), &id).await?)
}

/// Relationship status towards `id`
pub async fn friend_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<StatusResponse> {
    let status = state.core.friends().status(caller.as_str(), &id).await?;
    ok(StatusResponse { identity_id: id, status })
}

pub async fn unfriend(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    state.core.friends().unfriend(caller.as_str(), &id).await?;
    ok(json!({ "removed": true }))
}

pub async fn list_friends(State(state): State<AppState>, caller: CallerIdentity) -> ApiResult<Vec<Friend>> {
    ok(state.core.friends().list_friends(caller.as_str()).await?)
}

/// Incoming requests still waiting for the caller
pub async fn pending_requests(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Vec<PendingRequest>> {
    ok(state.core.friends().pending_requests(caller.as_str()).await?)
}

pub async fn accept_request(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<i32>,
) -> ApiResult<FriendRequest> {
    ok(state.core.friends().accept_request(id, caller.as_str()).await?)
}

pub async fn reject_request(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<i32>,
) -> ApiResult<FriendRequest> {
    ok(state.core.friends().reject_request(id, caller.as_str()).await?)
}
