use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 内置的占位签名密钥，只用于填充默认值，启动时会被拒绝
pub const PLACEHOLDER_JWT_SECRET: &str = "YOUR_SUPER_SECRET_KEY";

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub cache: CacheConfig,
    pub downstream: DownstreamConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 身份令牌校验参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    // 配置后校验 `iss`
    pub issuer: Option<String>,
    // 配置后校验 `aud`
    pub audience: Option<String>,
}

/// 风控参数缓存
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// 下游交易 API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    // 连接记录未携带地址时使用
    pub default_base_url: String,
    pub api_version: String,
    // 未配置时沿用 HTTP 客户端的默认行为
    pub timeout_secs: Option<u64>,
}

impl DownstreamConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: String,
    // 启动时导入的连接记录 (JSON 数组)，内存后端必填
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    // 配置后按天滚动写入该目录
    pub dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(), // 必须由配置覆盖
            issuer: None,
            audience: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 300,
        }
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            default_base_url: "https://demo.tradovateapi.com".to_string(),
            api_version: "v1".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            data_dir: "data".to_string(),
            seed_file: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret, PLACEHOLDER_JWT_SECRET);
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.downstream.api_version, "v1");
        assert!(config.downstream.timeout().is_none());
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.data_dir, "data");
        assert!(config.store.seed_file.is_none());
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"cache":{"ttl_secs":60},"store":{"backend":"memory"}}"#)
                .unwrap();
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.sweep_interval_secs, 300);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.server.port, 8080);
    }
}
