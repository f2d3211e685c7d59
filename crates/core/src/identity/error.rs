use thiserror::Error;

/// # Summary
/// 身份令牌校验失败的原因。
///
/// # Invariants
/// - 所有变体对外均表现为 401。
/// - `Unexpected` 代表校验器自身故障，调用方需按异常记录日志。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// 令牌已过期
    #[error("Identity token expired")]
    Expired,
    /// 签名、签发方或受众不匹配
    #[error("Invalid identity token")]
    Invalid,
    /// 令牌结构无法解析
    #[error("Malformed identity token")]
    Malformed,
    /// 校验过程中的未知故障
    #[error("Identity verification failed: {0}")]
    Unexpected(String),
}

impl AuthError {
    /// 是否属于预期内的失败 (过期或无效)。
    pub fn is_expected(&self) -> bool {
        !matches!(self, AuthError::Unexpected(_))
    }
}
