use super::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// # Summary
/// 凭据存储中的一条连接记录，将 (用户, 连接名) 映射到下游 API 令牌。
///
/// # Invariants
/// - `(subject, reference)` 组合唯一。
/// - `token` 缺失或为空的记录视为损坏，解析时按 "未找到" 处理。
#[derive(Clone)]
pub struct ConnectionRecord {
    // 所属用户
    pub subject: String,
    // 用户自定义的连接名
    pub reference: String,
    // 下游 API 访问令牌
    pub token: Option<String>,
    // 下游 API 基础地址 (可选，缺省时使用全局配置)
    pub base_url: Option<String>,
    // 创建时间
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRecord")
            .field("subject", &self.subject)
            .field("reference", &self.reference)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// # Summary
/// 解析完成的委托凭据，只在单次请求内存活。
///
/// # Invariants
/// - `base_url` 已规范化为下游 API 要求的带版本号形式。
/// - 不落盘、不写日志；`Debug` 输出隐藏令牌。
#[derive(Clone, PartialEq, Eq)]
pub struct DelegatedCredential {
    pub token: String,
    pub base_url: String,
}

impl fmt::Debug for DelegatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatedCredential")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// # Summary
/// 二级凭据存储接口 (Port)。
///
/// 请求路径只调用 `find`；`save`、`remove`、`list` 是维护接口，
/// 供启动导入 (`autoliq_store::seed`) 与运维工具写入和盘点连接记录。
///
/// # Invariants
/// - 查找未命中返回 `Ok(None)`，不得以错误形式表达。
/// - 实现需支持多请求并发访问。
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// # Summary
    /// 按 (用户, 连接名) 查找连接记录。
    ///
    /// # Arguments
    /// * `subject`: 用户唯一标识。
    /// * `reference`: 连接名。
    ///
    /// # Returns
    /// 存在返回 `Some(ConnectionRecord)`，否则返回 `None`。
    async fn find(
        &self,
        subject: &str,
        reference: &str,
    ) -> Result<Option<ConnectionRecord>, StoreError>;

    /// # Summary
    /// 保存或覆盖一条连接记录。
    ///
    /// # Logic
    /// 以 `(subject, reference)` 为键执行 Upsert。
    async fn save(&self, record: &ConnectionRecord) -> Result<(), StoreError>;

    /// # Summary
    /// 删除一条连接记录。
    ///
    /// # Returns
    /// 记录存在并被删除返回 `true`。
    async fn remove(&self, subject: &str, reference: &str) -> Result<bool, StoreError>;

    /// 列出某个用户名下的全部连接。
    async fn list(&self, subject: &str) -> Result<Vec<ConnectionRecord>, StoreError>;
}
