// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use social_feed_core::api::{router, AppState, IDENTITY_HEADER};
use social_feed_core::config::LimitsConfig;
use social_feed_core::SocialCore;
use tower::ServiceExt;

fn app() -> Router {
    let state = AppState {
        core: SocialCore::in_memory().unwrap(),
        limits: LimitsConfig::default(),
    };
    router(state, false)
}

async fn call(app: &Router, method: Method, uri: &str, caller: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(IDENTITY_HEADER, caller);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/friends", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn friend_flow_over_http() {
    let app = app();
    call(&app, Method::PUT, "/api/profiles/me", Some("u2"), Some(json!({ "handle": "grace" }))).await;

    let (status, body) = call(&app, Method::POST, "/api/friends/u2/request", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = call(&app, Method::POST, "/api/friends/u1/request", Some("u2"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = call(&app, Method::GET, "/api/friend-requests", Some("u2"), None).await;
    assert_eq!(body["data"][0]["requester"]["identity_id"], "u1");

    let uri = format!("/api/friend-requests/{request_id}/accept");
    let (status, _) = call(&app, Method::POST, &uri, Some("u1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, Method::POST, &uri, Some("u2"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, Method::GET, "/api/friends/u2/status", Some("u1"), None).await;
    assert_eq!(body["data"]["status"], "accepted");

    let (_, body) = call(&app, Method::GET, "/api/friends", Some("u1"), None).await;
    assert_eq!(body["data"][0]["identity"]["handle"], "grace");
}

#[tokio::test]
async fn messaging_over_http() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/api/friends/u2/request", Some("u1"), None).await;
    let request_id = body["data"]["id"].as_i64().unwrap();
    call(&app, Method::POST, &format!("/api/friend-requests/{request_id}/accept"), Some("u2"), None).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/conversations",
        Some("u1"),
        Some(json!({ "identity_id": "u2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = body["data"]["id"].as_i64().unwrap();
    let messages_uri = format!("/api/conversations/{conversation_id}/messages");

    for text in ["first", "second"] {
        let (status, _) = call(&app, Method::POST, &messages_uri, Some("u1"), Some(json!({ "content": text }))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = call(&app, Method::POST, &messages_uri, Some("u1"), Some(json!({ "content": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // returned oldest first
    let (_, body) = call(&app, Method::GET, &messages_uri, Some("u2"), None).await;
    assert_eq!(body["data"][0]["content"], "first");
    assert_eq!(body["data"][1]["content"], "second");

    let (status, _) = call(&app, Method::GET, &messages_uri, Some("u3"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = call(&app, Method::GET, "/api/conversations", Some("u2"), None).await;
    assert_eq!(body["data"][0]["unread_count"], 2);
    assert_eq!(body["data"][0]["other_participant"]["identity_id"], "u1");

    let read_uri = format!("/api/conversations/{conversation_id}/read");
    let (_, body) = call(&app, Method::POST, &read_uri, Some("u2"), None).await;
    assert_eq!(body["data"]["marked"], 2);
}

#[tokio::test]
async fn reactions_and_blocks_over_http() {
    let app = app();
    let (_, body) = call(&app, Method::POST, "/api/posts/p1/reactions", Some("u1"), Some(json!({ "kind": "like" }))).await;
    assert_eq!(body["data"]["outcome"], "added");
    let (_, body) = call(&app, Method::POST, "/api/posts/p1/reactions", Some("u1"), Some(json!({ "kind": "nope" }))).await;
    assert_eq!(body["data"]["outcome"], "ignored");

    let (_, body) = call(&app, Method::GET, "/api/posts/p1/reactions", Some("u1"), None).await;
    assert_eq!(body["data"]["counts"]["like"], 1);
    assert_eq!(body["data"]["mine"], "like");

    let (status, _) = call(&app, Method::POST, "/api/blocks/u1", Some("u1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = call(&app, Method::POST, "/api/blocks/u2", Some("u1"), None).await;
    assert_eq!(body["data"]["created"], true);
    let (_, body) = call(&app, Method::GET, "/api/friends/u1/status", Some("u2"), None).await;
    assert_eq!(body["data"]["status"], "blocked");
    let (_, body) = call(&app, Method::DELETE, "/api/blocks/u2", Some("u1"), None).await;
    assert_eq!(body["data"]["removed"], true);
}

#[tokio::test]
async fn history_rejects_unknown_entity_kinds() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/history/post/p1", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, _) = call(&app, Method::GET, "/api/history/score/p1", Some("u1"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_expose_counters() {
    let app = app();
    call(&app, Method::POST, "/api/friends/u2/request", Some("u1"), None).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("social_feed_friend_request_transitions_total{transition=\"sent\"} 1"));
}
