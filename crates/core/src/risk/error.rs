use thiserror::Error;

/// # Summary
/// 授权客户端对外暴露的封闭错误分类。
///
/// # Invariants
/// - 客户端的任何失败都必须落入以下变体之一，原始传输异常不得越过此边界。
/// - 上层只按变体分支，不再检查错误文本。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownstreamError {
    /// 委托凭据无效、过期，或调用者缺少该角色
    #[error("Downstream rejected credential: {0}")]
    Unauthorized(String),
    /// 资源对该凭据不存在
    #[error("Downstream resource not found: {0}")]
    NotFound(String),
    /// 下游限流
    #[error("Downstream rate limited: {0}")]
    RateLimited(String),
    /// 其余非 2xx 响应
    #[error("Downstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    /// 连接、超时等传输层故障
    #[error("Downstream transport error: {0}")]
    Transport(String),
    /// 2xx 响应体无法解析为预期结构
    #[error("Downstream response decode error: {0}")]
    Decode(String),
}
