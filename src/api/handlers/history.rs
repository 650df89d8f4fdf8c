// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};

use crate::api::identity::CallerIdentity;
use crate::api::routes::{ok, ApiResult};
use crate::api::AppState;
use crate::error::SocialError;
use crate::models::edit_history::{EditHistory, EntityKind};

/// Edit history of a post or comment, newest first
pub async fn get_history(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Vec<EditHistory>> {
    let kind = kind
        .parse::<EntityKind>()
        .map_err(|_| SocialError::InvalidInput("entity kind must be post or comment"))?;
    ok(state.core.history().history(kind, &id).await?)
}
