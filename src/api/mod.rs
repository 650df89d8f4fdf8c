// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

pub mod identity;
pub mod routes;
mod handlers;

use crate::config::{LimitsConfig, ServerConfig};
use crate::social::SocialCore;
use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use identity::{CallerIdentity, IDENTITY_HEADER};
pub use routes::ApiResponse;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub core: SocialCore,
    pub limits: LimitsConfig,
}

/// Build the HTTP router over the social core
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::get_metrics))

        // Profile routes
        .route("/api/profiles/me", put(handlers::profiles::register_profile))
        .route("/api/users/search", get(handlers::profiles::search_users))

        // Friend routes
        .route("/api/friends", get(handlers::friends::list_friends))
        .route("/api/friends/:id", delete(handlers::friends::unfriend))
        .route("/api/friends/:id/request", post(handlers::friends::send_request))
        .route("/api/friends/:id/status", get(handlers::friends::friend_status))
        .route("/api/friend-requests", get(handlers::friends::pending_requests))
        .route("/api/friend-requests/:id/accept", post(handlers::friends::accept_request))
        .route("/api/friend-requests/:id/reject", post(handlers::friends::reject_request))

        // Block routes
        .route("/api/blocks", get(handlers::blocks::list_blocked))
        .route(
            "/api/blocks/:id",
            post(handlers::blocks::block_user).delete(handlers::blocks::unblock_user),
        )

        // Conversation routes
        .route(
            "/api/conversations",
            get(handlers::conversations::list_conversations).post(handlers::conversations::open_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            get(handlers::conversations::list_messages).post(handlers::conversations::send_message),
        )
        .route("/api/conversations/:id/read", post(handlers::conversations::mark_read))

        // Reaction and history routes
        .route(
            "/api/posts/:id/reactions",
            get(handlers::reactions::get_reactions).post(handlers::reactions::react),
        )
        .route("/api/history/:kind/:id", get(handlers::history::get_history))

        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Start the API server and serve until ctrl-c
pub async fn start_api_server(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = router(state, config.enable_cors);

    let addr = format!("{}:{}", config.host, config.port)
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Starting API server on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
