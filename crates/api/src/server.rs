//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 组装依赖后调用。

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use autoliq_core::identity::port::IdentityVerifier;
use autoliq_gateway::risk::RiskGateway;

use crate::routes::{accounts, health, risk};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 所有字段在服务启动前注入，生命周期与进程等同；请求之间不共享其他可变状态。
#[derive(Clone)]
pub struct AppState {
    /// 风控参数网关 (连接解析 + 下游调用 + 缓存)
    pub gateway: Arc<RiskGateway>,
    /// 身份令牌校验器
    pub verifier: Arc<dyn IdentityVerifier>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AutoLiq 风控参数网关 API",
        version = "0.1.0",
        description = "以用户保存的委托凭据代理下游交易平台，读写账户的自动强平风控参数。"
    ),
    tags(
        (name = "系统 (System)", description = "健康检查"),
        (name = "风控 (Risk)", description = "账户风控参数的读取与写入"),
        (name = "账户 (Account)", description = "委托凭据可见的交易账户")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// 为 OpenAPI 文档注入全局 Bearer JWT 鉴权方案。
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("身份令牌（无需 'Bearer ' 前缀）"))
                    .build(),
            ),
        );
    }
}

// ============================================================
//  服务构建与启动
// ============================================================

/// 构建完整的 axum 应用路由树 (含 Swagger UI 与 CORS)。
///
/// # Arguments
/// * `state` - 由外部组装好的共享状态
pub fn build_router(state: AppState) -> Router {
    // 1. 无需鉴权的公开路由
    let public_router = OpenApiRouter::new().routes(routes!(health::health));

    // 2. 需要身份令牌的路由
    let protected_router = OpenApiRouter::new()
        .routes(routes!(risk::get_risk, risk::set_risk))
        .routes(routes!(accounts::list_accounts))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    // 3. 合并所有路由与自动收集的 OpenAPI Doc
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(public_router)
        .merge(protected_router)
        .with_state(state)
        .split_for_parts();

    // 4. 配置 CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// 绑定端口并启动 HTTP 服务，直到 `shutdown` 完成。
///
/// # Arguments
/// * `state` - 共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
/// * `shutdown` - 优雅停机信号
pub async fn start_server(
    state: AppState,
    bind_addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let app = build_router(state);

    tracing::info!("AutoLiq API Server listening on {}", bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
