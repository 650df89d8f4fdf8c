// Copyright (c) Social Feed Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::LimitsConfig;
use crate::error::SocialError;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response with message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap handler output in the success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// The request carried no verified caller identity.
    Unauthenticated,
    Social(SocialError),
}

impl From<SocialError> for ApiError {
    fn from(err: SocialError) -> Self {
        ApiError::Social(err)
    }
}

fn status_for(err: &SocialError) -> StatusCode {
    match err {
        SocialError::SelfReference | SocialError::EmptyContent | SocialError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        SocialError::Unauthorized | SocialError::Blocked | SocialError::NotFriends => StatusCode::FORBIDDEN,
        SocialError::NotFound(_) => StatusCode::NOT_FOUND,
        SocialError::AlreadyPending
        | SocialError::AlreadyFriends
        | SocialError::AlreadyProcessed
        | SocialError::HandleTaken => StatusCode::CONFLICT,
        SocialError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "missing caller identity".to_string()),
            ApiError::Social(err) => {
                let status = status_for(&err);
                if let SocialError::Store(store_err) = &err {
                    // keep storage details out of responses
                    error!("Storage failure while handling request: {}", store_err);
                    (status, "storage temporarily unavailable".to_string())
                } else {
                    (status, err.to_string())
                }
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// Pagination parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self, limits: &LimitsConfig) -> i64 {
        limits.page_size(self.limit)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn errors_map_to_http_statuses() {
        assert_eq!(status_for(&SocialError::SelfReference), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&SocialError::Blocked), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&SocialError::NotFound("conversation")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&SocialError::AlreadyPending), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&SocialError::Store(StoreError::Pool("timeout".into()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn pagination_clamps_to_configured_bounds() {
        let limits = LimitsConfig::default();
        let params = PaginationParams {
            limit: Some(1_000),
            offset: Some(-3),
        };
        assert_eq!(params.limit(&limits), 100);
        assert_eq!(params.offset(), 0);
        assert_eq!(PaginationParams::default().limit(&limits), 50);
    }
}
