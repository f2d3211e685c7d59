use crate::error::GatewayError;
use crate::resolver::ConnectionResolver;
use crate::settings_cache::SettingsCache;
use autoliq_core::identity::entity::Subject;
use autoliq_core::risk::entity::{
    Account, AccountId, RiskSettings, RiskSettingsUpdate, SettingsLookup,
};
use autoliq_core::risk::error::DownstreamError;
use autoliq_core::risk::port::{AutoLiqApi, ClientFactory};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 写入请求不含任何白名单字段时的错误文本
pub const EMPTY_UPDATE_MESSAGE: &str = "No valid risk settings fields provided";

/// # Summary
/// 风控参数网关，协调连接解析、下游调用与缓存。
///
/// # Invariants
/// - 读取优先命中缓存；未命中时所有者与授权方两次读取并发执行。
/// - 写入成功后先失效再回填缓存，保证后续读取看到写入结果。
pub struct RiskGateway {
    resolver: ConnectionResolver,
    factory: Arc<dyn ClientFactory>,
    cache: SettingsCache,
}

impl RiskGateway {
    pub fn new(
        resolver: ConnectionResolver,
        factory: Arc<dyn ClientFactory>,
        cache: SettingsCache,
    ) -> Self {
        Self {
            resolver,
            factory,
            cache,
        }
    }

    /// # Summary
    /// 为当前用户选择的连接构造授权客户端。
    ///
    /// # Arguments
    /// * `subject`: 已认证的用户。
    /// * `connection_ref`: 连接名，缺失时返回 `MissingParameter`。
    pub async fn connect(
        &self,
        subject: &Subject,
        connection_ref: Option<&str>,
    ) -> Result<Arc<dyn AutoLiqApi>, GatewayError> {
        let credential = self.resolver.resolve(subject, connection_ref).await?;
        Ok(self.factory.connect(credential))
    }

    /// # Summary
    /// 读取账户的生效风控参数。
    ///
    /// # Logic
    /// 1. 命中缓存直接返回，`cached = true`。
    /// 2. 并发读取所有者与授权方记录。
    /// 3. 权限拒绝在另一侧成功或同样被拒时被吞掉；其他错误直接返回，所有者优先。
    /// 4. 所有者字段覆盖授权方字段；两侧都无有效记录时返回 `None`。
    /// 5. 合并结果非空时写入缓存。
    ///
    /// # Arguments
    /// * `client`: 绑定委托凭据的下游客户端。
    /// * `account_id`: 目标账户。
    ///
    /// # Returns
    /// `SettingsLookup`，`settings` 为空表示账户没有风控参数。
    pub async fn get_settings(
        &self,
        client: &dyn AutoLiqApi,
        account_id: AccountId,
    ) -> Result<SettingsLookup, GatewayError> {
        if let Some(hit) = self.cache.get(account_id).await {
            debug!("Settings cache hit for account {}", account_id);
            return Ok(SettingsLookup {
                settings: Some(hit),
                cached: true,
            });
        }

        let (owner, permissioned) = futures::join!(
            client.owner_settings(account_id),
            client.permissioned_settings(account_id)
        );
        let owner = tolerate_denial(owner, "owner", account_id)?;
        let permissioned = tolerate_denial(permissioned, "permissioned", account_id)?;

        let merged = RiskSettings::merge(owner, permissioned);
        if let Some(settings) = &merged {
            self.cache.put(account_id, settings).await;
        }

        Ok(SettingsLookup {
            settings: merged,
            cached: false,
        })
    }

    /// # Summary
    /// 写入白名单内的风控参数。
    ///
    /// # Logic
    /// 1. 更新为空时直接返回 `Validation`，不调用下游。
    /// 2. 调用下游写入接口一次。
    /// 3. 按 `errorText` -> 所有者形态 -> 授权方形态 的顺序解读回包。
    /// 4. 失效并回填缓存。
    ///
    /// # Returns
    /// 下游返回的记录。
    pub async fn set_settings(
        &self,
        client: &dyn AutoLiqApi,
        account_id: AccountId,
        update: &RiskSettingsUpdate,
    ) -> Result<RiskSettings, GatewayError> {
        if update.is_empty() {
            return Err(GatewayError::Validation(EMPTY_UPDATE_MESSAGE.into()));
        }

        let reply = client.update_settings(account_id, update).await?;

        if let Some(text) = reply.error_text.filter(|t| !t.trim().is_empty()) {
            warn!("Downstream rejected update for account {}: {}", account_id, text);
            return Err(GatewayError::UpstreamRejected(text));
        }

        let written = reply
            .user_account_auto_liq
            .or(reply.permissioned_account_auto_liq)
            .ok_or(GatewayError::NoEntityReturned)?;

        self.cache.invalidate(account_id).await;
        self.cache.put(account_id, &written).await;

        info!("Risk settings updated for account {}", account_id);
        Ok(written)
    }

    /// 列出委托凭据可见的账户
    pub async fn list_accounts(&self, client: &dyn AutoLiqApi) -> Result<Vec<Account>, GatewayError> {
        Ok(client.list_accounts().await?)
    }
}

// 单侧权限拒绝视为该侧无记录
fn tolerate_denial(
    result: Result<Option<RiskSettings>, DownstreamError>,
    side: &str,
    account_id: AccountId,
) -> Result<Option<RiskSettings>, GatewayError> {
    match result {
        Ok(settings) => Ok(settings),
        Err(DownstreamError::Unauthorized(msg)) => {
            debug!("{} lookup denied for account {}: {}", side, account_id, msg);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
