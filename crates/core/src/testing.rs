//! # 测试替身
//!
//! 仅在 `test-utils` feature 下编译，为上层 crate 的测试提供可编排的下游 API。

use crate::risk::entity::{Account, AccountId, RiskSettings, RiskSettingsUpdate, UpdateReply};
use crate::risk::error::DownstreamError;
use crate::risk::port::{AutoLiqApi, ClientFactory};
use crate::store::port::DelegatedCredential;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

type Scripted<T> = Result<T, DownstreamError>;

/// # Summary
/// 内存版下游 API，可逐账户编排返回值并统计调用次数。
///
/// # Invariants
/// - 未编排的读取返回 `Ok(None)`。
/// - 未编排的写入会把更新应用到所有者记录上并以所有者形态回包，模拟真实下游。
#[derive(Default)]
pub struct ScriptedAutoLiqApi {
    owner: DashMap<AccountId, Scripted<Option<RiskSettings>>>,
    permissioned: DashMap<AccountId, Scripted<Option<RiskSettings>>>,
    update_replies: DashMap<AccountId, Scripted<UpdateReply>>,
    accounts: RwLock<Option<Scripted<Vec<Account>>>>,
    owner_calls: AtomicUsize,
    permissioned_calls: AtomicUsize,
    update_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl ScriptedAutoLiqApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_owner(&self, id: AccountId, reply: Scripted<Option<RiskSettings>>) {
        self.owner.insert(id, reply);
    }

    pub fn script_permissioned(&self, id: AccountId, reply: Scripted<Option<RiskSettings>>) {
        self.permissioned.insert(id, reply);
    }

    pub fn script_update(&self, id: AccountId, reply: Scripted<UpdateReply>) {
        self.update_replies.insert(id, reply);
    }

    pub async fn script_accounts(&self, reply: Scripted<Vec<Account>>) {
        *self.accounts.write().await = Some(reply);
    }

    /// 读取类调用总次数 (所有者 + 授权方)
    pub fn read_calls(&self) -> usize {
        self.owner_calls.load(Ordering::SeqCst) + self.permissioned_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AutoLiqApi for ScriptedAutoLiqApi {
    async fn owner_settings(
        &self,
        account_id: AccountId,
    ) -> Result<Option<RiskSettings>, DownstreamError> {
        self.owner_calls.fetch_add(1, Ordering::SeqCst);
        self.owner
            .get(&account_id)
            .map(|r| r.value().clone())
            .unwrap_or(Ok(None))
    }

    async fn permissioned_settings(
        &self,
        account_id: AccountId,
    ) -> Result<Option<RiskSettings>, DownstreamError> {
        self.permissioned_calls.fetch_add(1, Ordering::SeqCst);
        self.permissioned
            .get(&account_id)
            .map(|r| r.value().clone())
            .unwrap_or(Ok(None))
    }

    async fn update_settings(
        &self,
        account_id: AccountId,
        update: &RiskSettingsUpdate,
    ) -> Result<UpdateReply, DownstreamError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reply) = self.update_replies.get(&account_id) {
            return reply.value().clone();
        }

        let base = match self.owner.get(&account_id).map(|r| r.value().clone()) {
            Some(Ok(Some(existing))) => existing,
            _ => RiskSettings {
                id: Some(account_id),
                ..Default::default()
            },
        };
        let written = update.apply_to(base);
        self.owner.insert(account_id, Ok(Some(written.clone())));

        Ok(UpdateReply {
            user_account_auto_liq: Some(written),
            ..Default::default()
        })
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, DownstreamError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.accounts.read().await.clone().unwrap_or(Ok(Vec::new()))
    }
}

/// # Summary
/// 总是返回同一个下游替身的客户端工厂，并记录收到的凭据。
pub struct StaticClientFactory {
    api: Arc<ScriptedAutoLiqApi>,
    seen: DashMap<String, DelegatedCredential>,
}

impl StaticClientFactory {
    pub fn new(api: Arc<ScriptedAutoLiqApi>) -> Arc<Self> {
        Arc::new(Self {
            api,
            seen: DashMap::new(),
        })
    }

    /// 按令牌查询工厂收到过的凭据
    pub fn credential_for(&self, token: &str) -> Option<DelegatedCredential> {
        self.seen.get(token).map(|c| c.value().clone())
    }

    pub fn distinct_credentials(&self) -> usize {
        self.seen.len()
    }
}

impl ClientFactory for StaticClientFactory {
    fn connect(&self, credential: DelegatedCredential) -> Arc<dyn AutoLiqApi> {
        self.seen.insert(credential.token.clone(), credential);
        self.api.clone()
    }
}
