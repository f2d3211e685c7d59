//! # 配置加载
//!
//! 优先级由低到高：内置默认值 <- `autoliq.toml` (可选) <- `AUTOLIQ__` 前缀环境变量。

use std::path::Path;

use autoliq_core::config::{AppConfig, PLACEHOLDER_JWT_SECRET, StoreBackend};
use config::{Config, ConfigError, Environment, File, FileFormat};
use thiserror::Error;

/// 默认配置文件名 (位于工作目录)
pub const DEFAULT_CONFIG_FILE: &str = "autoliq.toml";
/// 环境变量前缀，层级分隔符为双下划线，如 `AUTOLIQ__SERVER__PORT`
pub const ENV_PREFIX: &str = "AUTOLIQ";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 作为最底层。
/// 2. 叠加配置文件 (不存在时忽略)。
/// 3. 叠加环境变量。
///
/// # Arguments
/// * `file`: 配置文件路径。
pub fn load(file: &Path) -> Result<AppConfig, ConfigError> {
    let defaults = Config::try_from(&AppConfig::default())?;

    Config::builder()
        .add_source(defaults)
        .add_source(File::from(file).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// 配置可以解析但不能用于启动
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("auth.jwt_secret is not set")]
    MissingSecret,
    #[error("auth.jwt_secret still holds the built-in placeholder")]
    PlaceholderSecret,
    #[error("store.backend = \"memory\" requires store.seed_file")]
    MemoryWithoutSeed,
}

/// # Summary
/// 启动前校验配置。
///
/// # Logic
/// 1. 签名密钥为空或仍是内置占位值时拒绝启动。
/// 2. 内存后端没有导入来源时拒绝启动，否则任何连接都无法解析。
pub fn validate(cfg: &AppConfig) -> Result<(), SettingsError> {
    let secret = cfg.auth.jwt_secret.trim();
    if secret.is_empty() {
        return Err(SettingsError::MissingSecret);
    }
    if secret == PLACEHOLDER_JWT_SECRET {
        return Err(SettingsError::PlaceholderSecret);
    }
    if cfg.store.backend == StoreBackend::Memory && cfg.store.seed_file.is_none() {
        return Err(SettingsError::MemoryWithoutSeed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.cache.ttl_secs, 3600);
        assert_eq!(cfg.downstream.api_version, "v1");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "[cache]\nttl_secs = 60\n\n[store]\nbackend = \"memory\"\n\n[downstream]\ntimeout_secs = 5"
        )
        .unwrap();

        let cfg = load(&path).unwrap();
        assert_eq!(cfg.cache.ttl_secs, 60);
        // 未覆盖的键保持默认
        assert_eq!(cfg.cache.sweep_interval_secs, 300);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.downstream.timeout(), Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn test_default_secret_is_rejected() {
        let mut cfg = AppConfig::default();
        assert_eq!(validate(&cfg), Err(SettingsError::PlaceholderSecret));

        cfg.auth.jwt_secret = "   ".into();
        assert_eq!(validate(&cfg), Err(SettingsError::MissingSecret));

        cfg.auth.jwt_secret = "a-real-deployment-secret".into();
        assert_eq!(validate(&cfg), Ok(()));
    }

    #[test]
    fn test_memory_backend_needs_seed_file() {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "a-real-deployment-secret".into();
        cfg.store.backend = StoreBackend::Memory;
        assert_eq!(validate(&cfg), Err(SettingsError::MemoryWithoutSeed));

        cfg.store.seed_file = Some("connections.json".into());
        assert_eq!(validate(&cfg), Ok(()));
    }
}
