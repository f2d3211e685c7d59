//! # 风控参数路由控制器
//!
//! 实现 `/risk/{account_id}` 路径下的读写接口。

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;

use autoliq_core::risk::entity::AccountId;

use crate::error::ApiError;
use crate::middleware::auth::CurrentSubject;
use crate::server::AppState;
use crate::types::{
    ApiErrorResponse, CONNECTION_REF_HEADER, ConnectionQuery, RiskResponse, RiskUpdateRequest,
    RiskUpdateResponse,
};

/// 解析路径中的账户 ID
pub(crate) fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map(AccountId)
        .map_err(|_| ApiError::Validation(format!("Invalid account id: {}", raw)))
}

/// 连接名优先取请求体 / 查询参数，其次取 `X-Connection-Ref` 请求头
pub(crate) fn connection_ref(explicit: Option<String>, headers: &HeaderMap) -> Option<String> {
    explicit.filter(|r| !r.trim().is_empty()).or_else(|| {
        headers
            .get(CONNECTION_REF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// 读取账户的生效风控参数
///
/// 所有者与授权方两份记录合并后返回，所有者字段优先。
#[utoipa::path(
    get,
    path = "/risk/{account_id}",
    tag = "风控 (Risk)",
    security(("bearer_jwt" = [])),
    params(
        ("account_id" = i64, Path, description = "下游交易账户 ID"),
        ConnectionQuery
    ),
    responses(
        (status = 200, description = "成功读取风控参数", body = RiskResponse),
        (status = 400, description = "缺少连接名", body = ApiErrorResponse),
        (status = 401, description = "未认证或委托凭据失效", body = ApiErrorResponse),
        (status = 404, description = "连接不存在", body = ApiErrorResponse),
        (status = 429, description = "下游限流", body = ApiErrorResponse)
    )
)]
pub async fn get_risk(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    Path(account_id): Path<String>,
    Query(query): Query<ConnectionQuery>,
    headers: HeaderMap,
) -> Result<Json<RiskResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;
    let reference = connection_ref(query.connection_ref, &headers);

    let client = state.gateway.connect(&subject, reference.as_deref()).await?;
    let lookup = state.gateway.get_settings(client.as_ref(), account_id).await?;

    Ok(Json(RiskResponse {
        success: true,
        auto_liq: lookup.settings,
        cached: lookup.cached,
    }))
}

/// 写入账户的风控参数
///
/// 仅白名单字段会下发；不含任何白名单字段时返回 400。
#[utoipa::path(
    post,
    path = "/risk/{account_id}",
    tag = "风控 (Risk)",
    security(("bearer_jwt" = [])),
    params(
        ("account_id" = i64, Path, description = "下游交易账户 ID")
    ),
    request_body = RiskUpdateRequest,
    responses(
        (status = 200, description = "写入成功", body = RiskUpdateResponse),
        (status = 400, description = "缺少连接名或没有可写字段", body = ApiErrorResponse),
        (status = 401, description = "未认证或委托凭据失效", body = ApiErrorResponse),
        (status = 404, description = "连接不存在", body = ApiErrorResponse),
        (status = 500, description = "下游拒绝写入", body = ApiErrorResponse)
    )
)]
pub async fn set_risk(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RiskUpdateRequest>, JsonRejection>,
) -> Result<Json<RiskUpdateResponse>, ApiError> {
    let account_id = parse_account_id(&account_id)?;
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let reference = connection_ref(req.connection_ref, &headers);

    let client = state.gateway.connect(&subject, reference.as_deref()).await?;
    let written = state
        .gateway
        .set_settings(client.as_ref(), account_id, &req.fields)
        .await?;

    Ok(Json(RiskUpdateResponse {
        success: true,
        auto_liq: written,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_connection_ref_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(connection_ref(None, &headers), None);

        headers.insert(CONNECTION_REF_HEADER, HeaderValue::from_static("FROM-HEADER"));
        assert_eq!(connection_ref(None, &headers).as_deref(), Some("FROM-HEADER"));
        assert_eq!(
            connection_ref(Some("  ".into()), &headers).as_deref(),
            Some("FROM-HEADER")
        );
        assert_eq!(
            connection_ref(Some("FROM-BODY".into()), &headers).as_deref(),
            Some("FROM-BODY")
        );
    }

    #[test]
    fn test_parse_account_id() {
        assert_eq!(parse_account_id("42").unwrap(), AccountId(42));
        assert!(matches!(parse_account_id("abc"), Err(ApiError::Validation(_))));
    }
}
