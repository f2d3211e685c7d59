use autoliq_cache::mem::MemCache;
use autoliq_core::cache::port::{Cache, CacheExt};
use autoliq_core::risk::entity::{AccountId, RiskSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;

/// # Summary
/// 风控参数的读穿透缓存，`AccountId -> RiskSettings`。
///
/// # Invariants
/// - 仅为建议性缓存，下游始终是数据的权威来源。
/// - 缓存故障只记录告警，按未命中 / 空操作处理，不使请求失败。
/// - 键只包含账户 ID，不含用户与连接。命中时不校验调用方凭据，
///   任何能解析出凭据的调用方都会拿到别人以自己凭据读取并缓存的记录。
///   仅适用于一个下游账户只归属一个终端用户的部署。
#[derive(Clone)]
pub struct SettingsCache {
    inner: Arc<dyn Cache>,
}

fn key(account_id: AccountId) -> String {
    format!("autoliq:{}", account_id)
}

impl SettingsCache {
    /// 包装任意 `Cache` 实现
    pub fn new(inner: Arc<dyn Cache>) -> Self {
        Self { inner }
    }

    /// # Summary
    /// 创建进程内 TTL 缓存并启动后台清扫协程。
    ///
    /// # Arguments
    /// * `ttl`: 条目存活时间。
    /// * `sweep_interval`: 清扫周期。
    ///
    /// # Returns
    /// 缓存实例与清扫协程句柄。
    pub fn in_memory(ttl: Duration, sweep_interval: Duration) -> (Self, JoinHandle<()>) {
        let mem = Arc::new(MemCache::with_ttl(ttl));
        let sweeper = mem.spawn_sweeper(sweep_interval);
        (Self::new(mem), sweeper)
    }

    pub async fn get(&self, account_id: AccountId) -> Option<RiskSettings> {
        match self.inner.get::<RiskSettings>(&key(account_id)).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Settings cache read failed for {}: {}", account_id, e);
                None
            }
        }
    }

    pub async fn put(&self, account_id: AccountId, settings: &RiskSettings) {
        if let Err(e) = self.inner.set(&key(account_id), settings).await {
            warn!("Settings cache write failed for {}: {}", account_id, e);
        }
    }

    pub async fn invalidate(&self, account_id: AccountId) {
        if let Err(e) = self.inner.del(&key(account_id)).await {
            warn!("Settings cache invalidate failed for {}: {}", account_id, e);
        }
    }
}
