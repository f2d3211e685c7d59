//! # DTO (Data Transfer Object) 层
//!
//! 面向前端 JSON 输出的请求与响应结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use autoliq_core::risk::entity::{Account, RiskSettings, RiskSettingsUpdate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// 连接名的备用请求头
pub const CONNECTION_REF_HEADER: &str = "x-connection-ref";

// ============================================================
//  请求 DTO
// ============================================================

/// 读取类接口的查询参数
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionQuery {
    /// 连接名，缺省时读取 `X-Connection-Ref` 请求头
    #[param(example = "TS-1")]
    pub connection_ref: Option<String>,
}

/// 风控参数写入请求体
///
/// 白名单以外的字段在反序列化时直接丢弃。
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskUpdateRequest {
    /// 连接名，缺省时读取 `X-Connection-Ref` 请求头
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "TS-1")]
    pub connection_ref: Option<String>,
    #[serde(flatten)]
    pub fields: RiskSettingsUpdate,
}

// ============================================================
//  响应 DTO
// ============================================================

/// 风控参数读取响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskResponse {
    pub success: bool,
    /// 合并后的风控参数，账户无配置时为 null
    pub auto_liq: Option<RiskSettings>,
    /// 是否由缓存直接返回
    pub cached: bool,
}

/// 风控参数写入响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskUpdateResponse {
    pub success: bool,
    /// 下游返回的写入结果
    pub auto_liq: RiskSettings,
}

/// 账户列表响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountsResponse {
    pub success: bool,
    pub accounts: Vec<Account>,
}

/// 健康检查响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    #[schema(example = "ok")]
    pub status: String,
}

/// 失败响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
    /// 机器可读的错误码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "TOKEN_EXPIRED")]
    pub code: Option<String>,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
            code: None,
        }
    }

    /// 从错误信息与错误码构建
    pub fn with_code(msg: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::from_msg(msg)
        }
    }
}

/// 身份令牌 Claims 内容 (内部使用，不暴露到 Swagger)
///
/// `iss` 与 `aud` 由 `Validation` 直接在原始声明上校验，这里不再解码，
/// 因此 `aud` 既可以是字符串也可以是数组。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户唯一标识
    pub sub: String,
    /// Token 过期时间 (Unix 时间戳)
    pub exp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_drops_unknown_fields() {
        let req: RiskUpdateRequest = serde_json::from_value(json!({
            "connectionRef": "TS-1",
            "dailyLossAutoLiq": 500,
            "changesLocked": true,
            "id": 7
        }))
        .unwrap();
        assert_eq!(req.connection_ref.as_deref(), Some("TS-1"));
        assert!(!req.fields.is_empty());
        assert!(req.fields.daily_loss_auto_liq.is_some());

        let empty: RiskUpdateRequest =
            serde_json::from_value(json!({"connectionRef": "TS-1", "foo": 1})).unwrap();
        assert!(empty.fields.is_empty());
    }

    #[test]
    fn test_error_envelope_shape() {
        let v = serde_json::to_value(ApiErrorResponse::with_code("boom", "UPSTREAM_ERROR")).unwrap();
        assert_eq!(v, json!({"success": false, "error": "boom", "code": "UPSTREAM_ERROR"}));
        let v = serde_json::to_value(ApiErrorResponse::from_msg("boom")).unwrap();
        assert!(v.get("code").is_none());
    }
}
