//! # `autoliq-gateway` - 风控参数网关
//!
//! 应用服务层：把 "用户 + 连接名" 解析为授权客户端，
//! 并在读写风控参数时协调下游调用、双来源合并与缓存一致性。

pub mod error;
pub mod resolver;
pub mod risk;
pub mod settings_cache;
