use async_trait::async_trait;
use autoliq_core::store::error::StoreError;
use autoliq_core::store::port::{ConnectionRecord, ConnectionStore};
use chrono::{DateTime, Utc};
use sqlx::{SqlitePool, sqlite::{SqliteConnectOptions, SqlitePoolOptions}};
use std::fs;
use std::path::Path;

/// 默认连接库文件名
const DEFAULT_CONNECTION_DB: &str = "connections.db";

type ConnectionRow = (String, String, Option<String>, Option<String>, DateTime<Utc>);

fn into_record(r: ConnectionRow) -> ConnectionRecord {
    ConnectionRecord {
        subject: r.0,
        reference: r.1,
        token: r.2,
        base_url: r.3,
        created_at: r.4,
    }
}

/// ConnectionStore 的 SQLite 实现。
///
/// # Summary
/// 在 `connections.db` 中保存 (用户, 连接名) 到下游凭据的映射。
///
/// # Invariants
/// * 数据库结构在存储实例创建时初始化。
/// * 所有操作均通过共享的 `SqlitePool` 执行。
/// * `token` 列允许为空，由上层决定如何处理损坏记录。
pub struct SqliteConnectionStore {
    pool: SqlitePool,
}

impl SqliteConnectionStore {
    /// 打开 (必要时创建) 数据目录下的连接库。
    ///
    /// # Logic
    /// 1. 确保数据目录存在。
    /// 2. 配置 SQLite 连接选项，开启 `create_if_missing`。
    /// 3. 连接到数据库并执行 DDL 初始化 `connections` 表。
    ///
    /// # Arguments
    /// * `data_dir` - 数据根目录。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 存储实例或初始化错误。
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = data_dir.as_ref();
        fs::create_dir_all(root).map_err(|e| StoreError::InitError(e.to_string()))?;

        let options = SqliteConnectOptions::new()
            .filename(root.join(DEFAULT_CONNECTION_DB))
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS connections (
                subject TEXT NOT NULL,
                reference TEXT NOT NULL,
                token TEXT,
                base_url TEXT,
                created_at DATETIME NOT NULL,
                PRIMARY KEY (subject, reference)
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ConnectionStore for SqliteConnectionStore {
    /// # Summary
    /// 按主键查询单条连接记录。
    async fn find(
        &self,
        subject: &str,
        reference: &str,
    ) -> Result<Option<ConnectionRecord>, StoreError> {
        let row = sqlx::query_as::<_, ConnectionRow>(
            "SELECT subject, reference, token, base_url, created_at FROM connections WHERE subject = ? AND reference = ?",
        )
        .bind(subject)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(row.map(into_record))
    }

    /// # Summary
    /// 保存或覆盖连接记录。
    ///
    /// # Logic
    /// 在 `connections` 表上执行 `INSERT OR REPLACE`。
    async fn save(&self, record: &ConnectionRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO connections (subject, reference, token, base_url, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.subject)
        .bind(&record.reference)
        .bind(&record.token)
        .bind(&record.base_url)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, subject: &str, reference: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM connections WHERE subject = ? AND reference = ?")
            .bind(subject)
            .bind(reference)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, subject: &str) -> Result<Vec<ConnectionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ConnectionRow>(
            "SELECT subject, reference, token, base_url, created_at FROM connections WHERE subject = ? ORDER BY reference",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(into_record).collect())
    }
}
