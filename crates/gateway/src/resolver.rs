use crate::error::GatewayError;
use autoliq_core::identity::entity::Subject;
use autoliq_core::store::port::{ConnectionStore, DelegatedCredential};
use std::sync::Arc;
use tracing::{debug, warn};

/// # Summary
/// 连接解析器：把 (用户, 连接名) 解析为规范化的委托凭据。
///
/// # Invariants
/// - 连接名缺失或为空时，在查询存储之前以 `MissingParameter` 拒绝。
/// - 返回的 `base_url` 总是以 `/{api_version}` 结尾且不带尾部斜杠。
/// - 凭据内容不写入日志。
pub struct ConnectionResolver {
    // 二级凭据存储
    store: Arc<dyn ConnectionStore>,
    // 记录未携带地址时的兜底地址
    default_base_url: String,
    // 下游 API 版本路径段，如 "v1"
    api_version: String,
}

impl ConnectionResolver {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        default_base_url: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            store,
            default_base_url: default_base_url.into(),
            api_version: api_version.into(),
        }
    }

    /// # Summary
    /// 解析委托凭据。
    ///
    /// # Logic
    /// 1. 校验连接名非空。
    /// 2. 按 (用户, 连接名) 查询存储；未命中 -> `ConnectionNotFound`。
    /// 3. 记录缺少令牌 -> `ConnectionNotFound`。
    /// 4. 选取记录地址或兜底地址并规范化。
    ///
    /// # Arguments
    /// * `subject`: 已认证的用户。
    /// * `connection_ref`: 用户选择的连接名。
    ///
    /// # Returns
    /// 规范化后的 `DelegatedCredential`。
    pub async fn resolve(
        &self,
        subject: &Subject,
        connection_ref: Option<&str>,
    ) -> Result<DelegatedCredential, GatewayError> {
        let reference = connection_ref
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| GatewayError::MissingParameter("connectionRef".into()))?;

        let record = self
            .store
            .find(subject.as_str(), reference)
            .await?
            .ok_or_else(|| {
                debug!("No connection {} for subject {}", reference, subject);
                GatewayError::ConnectionNotFound(reference.to_string())
            })?;

        let token = record
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                warn!("Connection {} for subject {} has no token", reference, subject);
                GatewayError::ConnectionNotFound(reference.to_string())
            })?;

        let raw_base = record
            .base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.default_base_url.clone());

        Ok(DelegatedCredential {
            token,
            base_url: normalize_base_url(&raw_base, &self.api_version),
        })
    }
}

/// # Summary
/// 规范化下游基础地址。
///
/// # Logic
/// 1. 去掉首尾空白与尾部斜杠。
/// 2. 末段不是版本号时追加 `/{version}`。
///
/// # Examples
/// `https://demo.tradovateapi.com/` -> `https://demo.tradovateapi.com/v1`
pub fn normalize_base_url(raw: &str, version: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let version = version.trim_matches('/');
    if version.is_empty() {
        return trimmed.to_string();
    }
    let suffix = format!("/{}", version);
    if trimmed.ends_with(&suffix) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, suffix)
    }
}
