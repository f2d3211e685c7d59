//! # 中间件

pub mod auth;
