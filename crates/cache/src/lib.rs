//! # `autoliq-cache` - 进程内缓存适配器
//!
//! 为 `autoliq-core` 中的 `Cache` 端口提供基于 `DashMap` 的 TTL 实现。

pub mod mem;
