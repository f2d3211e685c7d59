//! # `autoliq-store` - 凭据存储适配器
//!
//! 为 `ConnectionStore` 端口提供 SQLite 与内存两种实现，以及启动时的 JSON 导入。

pub mod connection;
pub mod memory;
pub mod seed;
