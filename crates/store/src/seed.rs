//! # 连接记录导入
//!
//! 启动时从 JSON 文件批量写入连接记录，内存后端依赖它获得初始数据。
//!
//! 文件格式为对象数组：
//!
//! ```json
//! [{"subject": "alice", "reference": "TS-1", "token": "...", "baseUrl": "https://demo.tradovateapi.com"}]
//! ```

use autoliq_core::store::error::StoreError;
use autoliq_core::store::port::{ConnectionRecord, ConnectionStore};
use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SeedEntry {
    subject: String,
    reference: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
}

/// # Summary
/// 解析导入文件内容。
///
/// # Logic
/// 1. 整体按 JSON 数组解析，任一条目格式错误即整体失败。
/// 2. `subject` 或 `reference` 为空白的条目拒绝导入。
pub fn parse(content: &str) -> Result<Vec<ConnectionRecord>, StoreError> {
    let entries: Vec<SeedEntry> = serde_json::from_str(content)
        .map_err(|e| StoreError::InitError(format!("Invalid seed file: {}", e)))?;

    let now = Utc::now();
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| {
            if e.subject.trim().is_empty() || e.reference.trim().is_empty() {
                return Err(StoreError::InitError(format!(
                    "Seed entry #{} has a blank subject or reference",
                    i
                )));
            }
            Ok(ConnectionRecord {
                subject: e.subject,
                reference: e.reference,
                token: e.token,
                base_url: e.base_url,
                created_at: now,
            })
        })
        .collect()
}

/// # Summary
/// 读取导入文件并逐条写入仓储。
///
/// # Arguments
/// * `store`: 目标仓储。
/// * `path`: JSON 文件路径。
///
/// # Returns
/// 写入的记录条数。同名记录按 `save` 语义覆盖。
pub async fn import(
    store: &dyn ConnectionStore,
    path: impl AsRef<Path>,
) -> Result<usize, StoreError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        StoreError::InitError(format!("Cannot read seed file {}: {}", path.display(), e))
    })?;

    let records = parse(&content)?;
    for record in &records {
        store.save(record).await?;
    }
    info!("Imported {} connection(s) from {}", records.len(), path.display());
    Ok(records.len())
}
