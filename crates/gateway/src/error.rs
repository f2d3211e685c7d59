use autoliq_core::risk::error::DownstreamError;
use autoliq_core::store::error::StoreError;
use thiserror::Error;

/// # Summary
/// 网关层的统一错误类型。
///
/// # Invariants
/// - 每个变体对应一种对外可区分的失败，由 API 层映射为状态码。
#[derive(Error, Debug)]
pub enum GatewayError {
    /// 请求缺少必要参数，在任何查找之前拒绝
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
    /// 连接记录不存在或缺少令牌
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),
    /// 写入请求不含任何白名单字段
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
    /// 下游在回包中明确给出的错误文本
    #[error("{0}")]
    UpstreamRejected(String),
    /// 下游写入成功但未返回任何记录形态
    #[error("No entity returned from downstream update")]
    NoEntityReturned,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
