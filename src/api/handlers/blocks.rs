// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::api::identity::CallerIdentity;
use crate::api::routes::{ok, ApiResult};
use crate::api::AppState;
use crate::models::blocking::{BlockOutcome, BlockedIdentity};

/// Identities the caller has blocked
pub async fn list_blocked(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Vec<BlockedIdentity>> {
    ok(state.core.blocks().list_blocked(caller.as_str()).await?)
}

pub async fn block_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<BlockOutcome> {
    ok(state.core.blocks().block(caller.as_str(), &id).await?)
}

pub async fn unblock_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let removed = state.core.blocks().unblock(caller.as_str(), &id).await?;
    ok(json!({ "removed": removed }))
}
