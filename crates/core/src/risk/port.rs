use crate::risk::entity::{Account, AccountId, RiskSettings, RiskSettingsUpdate, UpdateReply};
use crate::risk::error::DownstreamError;
use crate::store::port::DelegatedCredential;
use async_trait::async_trait;
use std::sync::Arc;

/// # Summary
/// 绑定单个委托凭据的下游交易 API 客户端接口 (Port)。
///
/// # Invariants
/// - 每个实例只持有一份凭据，按请求构造、用后即弃，不跨请求共享。
/// - 不做任何重试；失败一律以 `DownstreamError` 返回。
#[async_trait]
pub trait AutoLiqApi: Send + Sync {
    /// # Summary
    /// 读取 "所有者" 视角的风控参数。
    ///
    /// # Returns
    /// 下游无记录时返回 `Ok(None)`。
    async fn owner_settings(
        &self,
        account_id: AccountId,
    ) -> Result<Option<RiskSettings>, DownstreamError>;

    /// # Summary
    /// 读取 "授权方" 视角的风控参数。
    ///
    /// # Returns
    /// 下游无记录时返回 `Ok(None)`。
    async fn permissioned_settings(
        &self,
        account_id: AccountId,
    ) -> Result<Option<RiskSettings>, DownstreamError>;

    /// # Summary
    /// 调用下游的 "新建或更新" 接口写入风控参数。
    ///
    /// # Logic
    /// 1. 以 `accountId` 与白名单字段组装请求体。
    /// 2. 原样返回回包，由调用方解释记录形态与错误文本。
    async fn update_settings(
        &self,
        account_id: AccountId,
        update: &RiskSettingsUpdate,
    ) -> Result<UpdateReply, DownstreamError>;

    /// 列出该凭据可见的全部账户。
    async fn list_accounts(&self) -> Result<Vec<Account>, DownstreamError>;
}

/// # Summary
/// 授权客户端工厂。
///
/// # Invariants
/// - 工厂本身可跨请求共享 (例如持有连接池)，产出的客户端不可共享。
pub trait ClientFactory: Send + Sync {
    /// 基于一份已规范化的委托凭据构造客户端。
    fn connect(&self, credential: DelegatedCredential) -> Arc<dyn AutoLiqApi>;
}
