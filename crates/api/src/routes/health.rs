//! # 健康检查

use axum::Json;

use crate::types::HealthResponse;

/// 存活探针，无需鉴权
#[utoipa::path(
    get,
    path = "/health",
    tag = "系统 (System)",
    responses(
        (status = 200, description = "服务存活", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        status: "ok".into(),
    })
}
