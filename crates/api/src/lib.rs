//! # `autoliq-api` - HTTP API 网关
//!
//! 本 crate 是 AutoLiq 风控参数网关的 HTTP/REST 服务入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 校验身份令牌并把认证主体注入请求
//! - 解析连接名后调用 `RiskGateway` 完成风控参数读写
//! - 将网关错误映射为统一的 JSON 错误信封

pub mod types;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
