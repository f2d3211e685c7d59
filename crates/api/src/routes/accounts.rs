//! # 账户列表路由控制器

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;

use crate::error::ApiError;
use crate::middleware::auth::CurrentSubject;
use crate::routes::risk::connection_ref;
use crate::server::AppState;
use crate::types::{AccountsResponse, ApiErrorResponse, ConnectionQuery};

/// 列出委托凭据可见的交易账户
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "账户 (Account)",
    security(("bearer_jwt" = [])),
    params(ConnectionQuery),
    responses(
        (status = 200, description = "成功获取账户列表", body = AccountsResponse),
        (status = 400, description = "缺少连接名", body = ApiErrorResponse),
        (status = 401, description = "未认证或委托凭据失效", body = ApiErrorResponse),
        (status = 404, description = "连接不存在", body = ApiErrorResponse)
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    Query(query): Query<ConnectionQuery>,
    headers: HeaderMap,
) -> Result<Json<AccountsResponse>, ApiError> {
    let reference = connection_ref(query.connection_ref, &headers);
    let client = state.gateway.connect(&subject, reference.as_deref()).await?;
    let accounts = state.gateway.list_accounts(client.as_ref()).await?;

    Ok(Json(AccountsResponse {
        success: true,
        accounts,
    }))
}
