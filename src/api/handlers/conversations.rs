// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::identity::CallerIdentity;
use crate::api::routes::{ok, ApiResult, PaginationParams};
use crate::api::AppState;
use crate::models::messaging::{ConversationDetail, ConversationSummary, MessageDetail};

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    pub identity_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Get or create the conversation with another identity
pub async fn open_conversation(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(body): Json<OpenConversationRequest>,
) -> ApiResult<ConversationDetail> {
    ok(state
        .core
        .conversations()
        .get_or_create(caller.as_str(), &body.identity_id)
        .await?)
}

pub async fn list_conversations(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Vec<ConversationSummary>> {
    ok(state.core.messenger().list_conversations(caller.as_str()).await?)
}

/// A page of messages, returned oldest first
pub async fn list_messages(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<i32>,
    Query(page): Query<PaginationParams>,
) -> ApiResult<Vec<MessageDetail>> {
    state.core.conversations().conversation_for(id, caller.as_str()).await?;

    let mut messages = state
        .core
        .messenger()
        .list_messages(id, page.limit(&state.limits), page.offset())
        .await?;
    messages.reverse();
    ok(messages)
}

pub async fn send_message(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<i32>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<MessageDetail> {
    ok(state.core.messenger().send(id, caller.as_str(), &body.content).await?)
}

/// Mark every message from the other participant as read
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    state.core.conversations().conversation_for(id, caller.as_str()).await?;
    let marked = state.core.messenger().mark_read(id, caller.as_str()).await?;
    ok(json!({ "marked": marked }))
}
