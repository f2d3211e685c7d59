use anyhow::Result;
use autoliq_core::store::port::{ConnectionRecord, ConnectionStore};
use autoliq_store::connection::SqliteConnectionStore;
use autoliq_store::memory::MemoryConnectionStore;
use chrono::{DurationRound, TimeDelta, Utc};

fn record(subject: &str, reference: &str, token: Option<&str>) -> ConnectionRecord {
    ConnectionRecord {
        subject: subject.to_string(),
        reference: reference.to_string(),
        token: token.map(str::to_string),
        base_url: Some("https://demo.tradovateapi.com".to_string()),
        // 截断到秒，避免 SQLite 往返的精度差异
        created_at: Utc::now()
            .duration_trunc(TimeDelta::seconds(1))
            .unwrap_or_else(|_| Utc::now()),
    }
}

/// 两种实现共享的行为约束
async fn exercise_store(store: &dyn ConnectionStore) -> Result<()> {
    // 未命中不是错误
    assert!(store.find("alice", "TS-1").await?.is_none());

    store.save(&record("alice", "TS-1", Some("tok-a1"))).await?;
    store.save(&record("alice", "TS-2", None)).await?;
    store.save(&record("bob", "TS-1", Some("tok-b1"))).await?;

    // 连接名按用户隔离
    let a1 = store.find("alice", "TS-1").await?.expect("alice TS-1");
    assert_eq!(a1.token.as_deref(), Some("tok-a1"));
    let b1 = store.find("bob", "TS-1").await?.expect("bob TS-1");
    assert_eq!(b1.token.as_deref(), Some("tok-b1"));

    // 缺少令牌的记录照样返回，由上层判定
    let a2 = store.find("alice", "TS-2").await?.expect("alice TS-2");
    assert!(a2.token.is_none());

    // 覆盖写
    store.save(&record("alice", "TS-1", Some("tok-a1-refreshed"))).await?;
    let a1 = store.find("alice", "TS-1").await?.expect("alice TS-1");
    assert_eq!(a1.token.as_deref(), Some("tok-a1-refreshed"));

    let refs: Vec<String> = store
        .list("alice")
        .await?
        .into_iter()
        .map(|r| r.reference)
        .collect();
    assert_eq!(refs, vec!["TS-1".to_string(), "TS-2".to_string()]);

    assert!(store.remove("alice", "TS-2").await?);
    assert!(!store.remove("alice", "TS-2").await?);
    assert!(store.find("alice", "TS-2").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_memory_connection_store() -> Result<()> {
    let store = MemoryConnectionStore::new();
    exercise_store(&store).await
}

#[tokio::test]
async fn test_sqlite_connection_store() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = SqliteConnectionStore::open(tmp.path()).await?;
    exercise_store(&store).await
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    {
        let store = SqliteConnectionStore::open(tmp.path()).await?;
        store.save(&record("carol", "LIVE", Some("tok-c"))).await?;
    }

    let reopened = SqliteConnectionStore::open(tmp.path()).await?;
    let found = reopened.find("carol", "LIVE").await?.expect("persisted");
    assert_eq!(found.token.as_deref(), Some("tok-c"));
    assert_eq!(
        found.base_url.as_deref(),
        Some("https://demo.tradovateapi.com")
    );
    Ok(())
}
