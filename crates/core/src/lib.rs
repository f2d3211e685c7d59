//! # `autoliq-core` - 领域核心
//!
//! 只包含实体、端口 (Trait) 与错误定义，不依赖任何具体的传输或存储实现。
//! 上层 crate 通过 `Arc<dyn Port>` 注入具体适配器。

pub mod config;

pub mod identity {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod store {
    pub mod error;
    pub mod port;
}

pub mod risk {
    pub mod entity;
    pub mod error;
    pub mod port;
}

pub mod cache {
    pub mod error;
    pub mod port;
}

#[cfg(feature = "test-utils")]
pub mod testing;
