use crate::identity::entity::Subject;
use crate::identity::error::AuthError;

/// # Summary
/// 身份令牌校验接口 (Port)。
///
/// # Invariants
/// - 实现必须是 `Send + Sync`，可在多个请求间共享。
/// - 校验为纯计算，不发起网络调用，因此为同步接口。
pub trait IdentityVerifier: Send + Sync {
    /// # Summary
    /// 校验不透明的 Bearer 令牌并返回认证主体。
    ///
    /// # Arguments
    /// * `token`: 去掉 `Bearer ` 前缀后的原始令牌。
    ///
    /// # Returns
    /// 成功返回 `Subject`，失败返回 `AuthError`。
    fn verify(&self, token: &str) -> Result<Subject, AuthError>;
}
