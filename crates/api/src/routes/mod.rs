//! # 路由控制器

pub mod accounts;
pub mod health;
pub mod risk;
