//! # 鉴权中间件
//!
//! 校验 `Authorization: Bearer <token>` 身份令牌，并把 `AuthContext` 注入请求。

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use autoliq_core::config::AuthConfig;
use autoliq_core::identity::entity::{AuthContext, Subject};
use autoliq_core::identity::error::AuthError;
use autoliq_core::identity::port::IdentityVerifier;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::Claims;

/// # Summary
/// 基于 HS256 共享密钥的身份令牌校验器。
///
/// # Invariants
/// - `exp` 与 `sub` 为必填声明。
/// - 配置了 issuer / audience 时才校验对应声明。
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(&cfg.jwt_secret, cfg.issuer.as_deref(), cfg.audience.as_deref())
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_) => AuthError::Invalid,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::Malformed,
                _ => AuthError::Unexpected(e.to_string()),
            }
        })?;

        Subject::new(data.claims.sub).ok_or(AuthError::Invalid)
    }
}

/// 提取并验证 Authorization: Bearer <token>
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req.headers().get(axum::http::header::AUTHORIZATION);

    let token = match auth_header {
        Some(header_val) => {
            let s = header_val
                .to_str()
                .map_err(|_| ApiError::Unauthenticated("Invalid Authorization header format".into()))?;
            match s.strip_prefix("Bearer ").map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => {
                    tracing::warn!("Invalid Bearer format");
                    return Err(ApiError::Unauthenticated(
                        "Invalid Authorization header format".into(),
                    ));
                }
            }
        }
        None => {
            tracing::warn!("Missing Authorization header");
            return Err(ApiError::Unauthenticated("Missing Authorization header".into()));
        }
    };

    let subject = match state.verifier.verify(&token) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Identity verification failed: {}", e);
            return Err(e.into());
        }
    };

    // 以显式上下文注入，handler 通过 `CurrentSubject` 提取
    req.extensions_mut().insert(AuthContext { subject });

    Ok(next.run(req).await)
}

// 在提取器中获取当前用户的快捷方式
pub struct CurrentSubject(pub Subject);

impl<S> FromRequestParts<S> for CurrentSubject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthenticated("Missing auth context".into()))?;
        Ok(CurrentSubject(ctx.subject))
    }
}
