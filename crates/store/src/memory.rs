use async_trait::async_trait;
use autoliq_core::store::error::StoreError;
use autoliq_core::store::port::{ConnectionRecord, ConnectionStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// # Summary
/// 基于内存的连接记录仓储实现。
///
/// 作为 `ConnectionStore` 的适配器，用于测试与无需持久化的部署。
pub struct MemoryConnectionStore {
    records: Arc<RwLock<HashMap<(String, String), ConnectionRecord>>>,
}

impl MemoryConnectionStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionStore for MemoryConnectionStore {
    async fn find(
        &self,
        subject: &str,
        reference: &str,
    ) -> Result<Option<ConnectionRecord>, StoreError> {
        let key = (subject.to_string(), reference.to_string());
        Ok(self.records.read().await.get(&key).cloned())
    }

    async fn save(&self, record: &ConnectionRecord) -> Result<(), StoreError> {
        let key = (record.subject.clone(), record.reference.clone());
        self.records.write().await.insert(key, record.clone());
        Ok(())
    }

    async fn remove(&self, subject: &str, reference: &str) -> Result<bool, StoreError> {
        let key = (subject.to_string(), reference.to_string());
        Ok(self.records.write().await.remove(&key).is_some())
    }

    async fn list(&self, subject: &str) -> Result<Vec<ConnectionRecord>, StoreError> {
        let guard = self.records.read().await;
        let mut out: Vec<ConnectionRecord> = guard
            .values()
            .filter(|r| r.subject == subject)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(out)
    }
}
