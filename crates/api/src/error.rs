//! # API 统一错误处理
//!
//! 将下层各 crate 的错误类型统一映射到 HTTP 状态码、错误码与 JSON 响应体。

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use autoliq_core::identity::error::AuthError;
use autoliq_core::risk::error::DownstreamError;
use autoliq_gateway::error::GatewayError;

use crate::types::ApiErrorResponse;

/// API 层统一错误枚举
#[derive(Error, Debug)]
pub enum ApiError {
    /// 身份令牌缺失或无效 (401)
    #[error("{0}")]
    Unauthenticated(String),

    /// 委托凭据被下游拒绝 (401)
    #[error("{0}")]
    TokenExpired(String),

    /// 缺少必要参数 (400)
    #[error("{0}")]
    MissingParameter(String),

    /// 请求体或路径参数不合法 (400)
    #[error("{0}")]
    Validation(String),

    /// 连接或下游资源不存在 (404)
    #[error("{0}")]
    NotFound(String),

    /// 下游限流 (429)
    #[error("{0}")]
    RateLimited(String),

    /// 下游失败，消息原样透传 (500)
    #[error("{0}")]
    Upstream(String),

    /// 内部错误 (500)
    #[error("内部服务错误: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            ApiError::TokenExpired(_) => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            ApiError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ApiError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

/// 将 `ApiError` 转换为 axum 的 HTTP 响应
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::Internal(msg) => {
                // 内部错误只记录日志，不向客户端透传细节
                tracing::error!("内部服务错误: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ApiErrorResponse::with_code(message, code));
        (status, body).into_response()
    }
}

/// 从 `AuthError` 转换：所有失败都表现为 401
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if !err.is_expected() {
            tracing::error!("Identity verifier failure: {}", err);
        }
        ApiError::Unauthenticated(err.to_string())
    }
}

/// 从 `DownstreamError` 转换
impl From<DownstreamError> for ApiError {
    fn from(err: DownstreamError) -> Self {
        match err {
            DownstreamError::Unauthorized(msg) => ApiError::TokenExpired(msg),
            DownstreamError::NotFound(msg) => ApiError::NotFound(msg),
            DownstreamError::RateLimited(msg) => ApiError::RateLimited(msg),
            DownstreamError::Upstream { message, .. } => ApiError::Upstream(message),
            DownstreamError::Transport(msg) | DownstreamError::Decode(msg) => {
                ApiError::Upstream(msg)
            }
        }
    }
}

/// 从 `GatewayError` 转换
impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MissingParameter(param) => {
                ApiError::MissingParameter(format!("Missing required parameter: {}", param))
            }
            GatewayError::ConnectionNotFound(_) => ApiError::NotFound(err.to_string()),
            GatewayError::Validation(msg) => ApiError::Validation(msg),
            GatewayError::Downstream(e) => e.into(),
            GatewayError::UpstreamRejected(msg) => ApiError::Upstream(msg),
            GatewayError::NoEntityReturned => ApiError::Upstream(err.to_string()),
            GatewayError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
