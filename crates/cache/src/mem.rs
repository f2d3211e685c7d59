use async_trait::async_trait;
use autoliq_core::cache::error::CacheError;
use autoliq_core::cache::port::Cache;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// 默认条目存活时间 (1 小时)
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// 单个缓存条目，携带绝对过期时刻。
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// # Summary
/// 基于 DashMap 的进程内 TTL 缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 每个键只保留一个条目，后写覆盖先写，不做版本控制。
/// - 读取时已过期的条目视为不存在并被顺带移除；后台清扫任务负责回收无人再读的条目。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, Entry>,
    // 条目存活时间
    ttl: Duration,
}

impl MemCache {
    /// # Summary
    /// 使用默认 TTL 创建缓存。
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// # Summary
    /// 使用指定 TTL 创建缓存。
    ///
    /// # Arguments
    /// * `ttl`: 条目自写入起的存活时间。
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            storage: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 当前条目数 (含尚未被清扫的过期条目)
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// # Summary
    /// 移除全部已过期条目。
    ///
    /// # Returns
    /// 被移除的条目数量。
    pub fn purge(&self) -> usize {
        let now = Instant::now();
        let before = self.storage.len();
        self.storage.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.storage.len())
    }

    /// # Summary
    /// 启动后台清扫协程，按固定周期回收过期条目，与请求流量无关。
    ///
    /// # Logic
    /// 1. 协程只持有缓存的弱引用。
    /// 2. 每个周期尝试 upgrade，成功则执行 `purge`。
    /// 3. 缓存已被释放时协程自行退出。
    ///
    /// # Arguments
    /// * `period`: 清扫周期。
    ///
    /// # Returns
    /// 协程句柄，调用方可用于提前中止。
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            info!("Cache sweeper started, period {:?}", period);
            // interval 不接受零周期
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    debug!("Cache dropped, sweeper exiting");
                    break;
                };
                let removed = cache.purge();
                if removed > 0 {
                    debug!("Cache sweeper evicted {} expired entries", removed);
                }
            }
        })
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Logic
    /// 将 Key 转换为 String 后与 Value 一并插入哈希表，过期时刻为当前时间加 TTL。
    /// 若存在同名 Key 则覆盖。
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.storage.insert(key.to_string(), entry);
        Ok(())
    }

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 1. 命中且未过期时克隆返回。
    /// 2. 命中但已过期时移除该条目并返回 None。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.storage.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        } else {
            return Ok(None);
        }
        // 读锁已释放，再按条件移除，避免误删并发写入的新条目
        self.storage.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    /// # Summary
    /// 删除指定键。无论键是否存在均返回 Ok。
    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }
}
