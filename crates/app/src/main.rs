mod logging;
mod settings;

use std::path::Path;
use std::sync::Arc;

use autoliq_api::middleware::auth::JwtVerifier;
use autoliq_api::server::{AppState, start_server};
use autoliq_client::http::HttpClientFactory;
use autoliq_core::config::StoreBackend;
use autoliq_core::store::port::ConnectionStore;
use autoliq_gateway::resolver::ConnectionResolver;
use autoliq_gateway::risk::RiskGateway;
use autoliq_gateway::settings_cache::SettingsCache;
use autoliq_store::connection::SqliteConnectionStore;
use autoliq_store::memory::MemoryConnectionStore;
use autoliq_store::seed;
use tracing::{error, info, warn};

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到网关与 API 层。
///
/// # Logic
/// 1. 加载 `.env` 与配置，初始化全局日志；配置不可用时拒绝启动。
/// 2. 实例化基础设施层（连接存储及其导入、HTTP 客户端工厂、缓存）。
/// 3. 构造应用服务层（RiskGateway）。
/// 4. 启动 HTTP 服务，收到退出信号后优雅停机。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let dotenv = dotenvy::dotenv();
    let cfg = settings::load(Path::new(settings::DEFAULT_CONFIG_FILE))?;
    let _log_guard = logging::init(&cfg.log);
    if let Err(e) = dotenv {
        info!("No .env loaded: {}", e);
    }
    if let Err(e) = settings::validate(&cfg) {
        error!("Refusing to start: {}", e);
        return Err(e.into());
    }
    info!("AutoLiq gateway starting...");

    // 2. 实例化基础设施层
    let store: Arc<dyn ConnectionStore> = match cfg.store.backend {
        StoreBackend::Sqlite => Arc::new(SqliteConnectionStore::open(&cfg.store.data_dir).await?),
        StoreBackend::Memory => {
            warn!("Using in-memory connection store; connections are lost on restart");
            Arc::new(MemoryConnectionStore::new())
        }
    };
    if let Some(path) = &cfg.store.seed_file {
        seed::import(store.as_ref(), path).await?;
    }
    let factory = Arc::new(HttpClientFactory::new(cfg.downstream.timeout())?);
    let (cache, sweeper) = SettingsCache::in_memory(cfg.cache.ttl(), cfg.cache.sweep_interval());

    // 3. 构造应用服务层
    let resolver = ConnectionResolver::new(
        store,
        cfg.downstream.default_base_url.clone(),
        cfg.downstream.api_version.clone(),
    );
    let gateway = Arc::new(RiskGateway::new(resolver, factory, cache));

    let state = AppState {
        gateway,
        verifier: Arc::new(JwtVerifier::from_config(&cfg.auth)),
    };

    // 4. 启动服务并挂起等待退出信号
    let bind_addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    start_server(state, &bind_addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received. Exiting...");
    })
    .await?;

    sweeper.abort();
    Ok(())
}
