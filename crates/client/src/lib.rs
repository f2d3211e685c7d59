//! # `autoliq-client` - 下游交易 API 适配器
//!
//! 基于 `reqwest` 实现 `AutoLiqApi` 与 `ClientFactory` 端口。
//! 所有失败在本 crate 内归类为 `DownstreamError`，上层不接触传输层异常。

pub mod classify;
pub mod http;
