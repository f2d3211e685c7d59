//! # 下游错误归类
//!
//! 下游 API 没有稳定的机器可读错误码，权限拒绝只能从状态码和少量已知文案判断。
//! 文案匹配是尽力而为的启发式规则，只允许存在于本模块。

use autoliq_core::risk::error::DownstreamError;
use serde_json::Value;

/// 已知的权限拒绝文案 (小写比较)
const DENIAL_PHRASES: &[&str] = &[
    "access is denied",
    "should be account owner",
    "expired access token",
    "unauthorized",
];

/// 透传给调用方的错误文本上限
const MAX_MESSAGE_LEN: usize = 512;

/// # Summary
/// 判断一段下游错误文本是否代表权限拒绝。
pub fn is_permission_denial(message: &str) -> bool {
    let lower = message.to_lowercase();
    DENIAL_PHRASES.iter().any(|p| lower.contains(p))
}

/// # Summary
/// 从下游响应体中提取可读的错误信息。
///
/// # Logic
/// 1. 尝试按 JSON 解析，依次取 `errorText`、`message`、`error` 字段。
/// 2. 否则使用原始文本 (截断)。
/// 3. 响应体为空时返回 `None`。
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["errorText", "message", "error"] {
            if let Some(Value::String(s)) = map.get(key)
                && !s.trim().is_empty()
            {
                return Some(s.clone());
            }
        }
    }

    Some(trimmed.chars().take(MAX_MESSAGE_LEN).collect())
}

/// # Summary
/// 将非 2xx 响应归类为 `DownstreamError`。
///
/// # Logic
/// 1. 401/403 -> `Unauthorized`。
/// 2. 404 -> `NotFound`。
/// 3. 429 -> `RateLimited`。
/// 4. 其余状态码若携带权限拒绝文案 -> `Unauthorized`，否则 -> `Upstream`。
///
/// # Arguments
/// * `status`: HTTP 状态码。
/// * `body`: 原始响应体。
pub fn classify(status: u16, body: &str) -> DownstreamError {
    let message = extract_message(body).unwrap_or_else(|| format!("HTTP {}", status));
    match status {
        401 | 403 => DownstreamError::Unauthorized(message),
        404 => DownstreamError::NotFound(message),
        429 => DownstreamError::RateLimited(message),
        _ if is_permission_denial(&message) => DownstreamError::Unauthorized(message),
        _ => DownstreamError::Upstream { status, message },
    }
}

/// # Summary
/// 检查 2xx 响应体是否其实是一次权限拒绝。
///
/// # Logic
/// 只看 `errorText` 字段，普通业务错误文本交由调用方解释。
pub fn denial_in_success_body(body: &str) -> Option<DownstreamError> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body.trim()) else {
        return None;
    };
    match map.get("errorText") {
        Some(Value::String(text)) if is_permission_denial(text) => {
            Some(DownstreamError::Unauthorized(text.clone()))
        }
        _ => None,
    }
}

/// # Summary
/// 检查读接口的 2xx 响应体是否携带任意错误文本。
///
/// # Logic
/// 1. 非空 `errorText` 且为拒绝文案 -> `Unauthorized`。
/// 2. 其余非空 `errorText` -> `Upstream`，保留原状态码。
///
/// 读接口的正常载荷从不包含 `errorText`，写接口请改用 `denial_in_success_body`。
pub fn rejection_in_success_body(status: u16, body: &str) -> Option<DownstreamError> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body.trim()) else {
        return None;
    };
    match map.get("errorText") {
        Some(Value::String(text)) if !text.trim().is_empty() => {
            if is_permission_denial(text) {
                Some(DownstreamError::Unauthorized(text.clone()))
            } else {
                Some(DownstreamError::Upstream {
                    status,
                    message: text.clone(),
                })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(classify(401, ""), DownstreamError::Unauthorized(_)));
        assert!(matches!(classify(403, "{}"), DownstreamError::Unauthorized(_)));
        assert!(matches!(classify(404, "missing"), DownstreamError::NotFound(_)));
        assert!(matches!(classify(429, ""), DownstreamError::RateLimited(_)));
        assert_eq!(
            classify(502, "bad gateway"),
            DownstreamError::Upstream {
                status: 502,
                message: "bad gateway".into()
            }
        );
    }

    #[test]
    fn test_denial_phrase_on_other_status() {
        let err = classify(400, r#"{"errorText":"Access is denied"}"#);
        assert_eq!(err, DownstreamError::Unauthorized("Access is denied".into()));

        let err = classify(500, r#"{"errorText":"Should be account owner"}"#);
        assert!(matches!(err, DownstreamError::Unauthorized(_)));
    }

    #[test]
    fn test_empty_body_uses_status() {
        assert_eq!(
            classify(500, "  "),
            DownstreamError::Upstream {
                status: 500,
                message: "HTTP 500".into()
            }
        );
    }

    #[test]
    fn test_extract_message_prefers_error_text() {
        assert_eq!(
            extract_message(r#"{"message":"m","errorText":"e"}"#).as_deref(),
            Some("e")
        );
        assert_eq!(extract_message(r#"{"error":"oops"}"#).as_deref(), Some("oops"));
        let long = "x".repeat(2000);
        assert_eq!(extract_message(&long).map(|m| m.len()), Some(MAX_MESSAGE_LEN));
    }

    #[test]
    fn test_denial_in_success_body() {
        assert!(denial_in_success_body(r#"{"errorText":"Access is denied"}"#).is_some());
        assert!(denial_in_success_body(r#"{"errorText":"Daily loss must be positive"}"#).is_none());
        assert!(denial_in_success_body(r#"{"id":1}"#).is_none());
        assert!(denial_in_success_body("null").is_none());
    }

    #[test]
    fn test_rejection_in_success_body() {
        assert_eq!(
            rejection_in_success_body(200, r#"{"errorText":"Account is locked for maintenance"}"#),
            Some(DownstreamError::Upstream {
                status: 200,
                message: "Account is locked for maintenance".into()
            })
        );
        assert_eq!(
            rejection_in_success_body(200, r#"{"errorText":"Access is denied"}"#),
            Some(DownstreamError::Unauthorized("Access is denied".into()))
        );
        assert!(rejection_in_success_body(200, r#"{"errorText":"  "}"#).is_none());
        assert!(rejection_in_success_body(200, r#"{"id":1}"#).is_none());
        assert!(rejection_in_success_body(200, "[]").is_none());
    }
}
