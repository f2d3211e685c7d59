use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 已认证的终端用户标识，仅由身份校验器产生。
///
/// # Invariants
/// - 内容非空，在一次请求的生命周期内不可变。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(String);

impl Subject {
    /// 由身份校验器构造。空字符串返回 `None`。
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Summary
/// 鉴权步骤的产物，显式传入下游业务操作。
///
/// # Invariants
/// - 只能在身份令牌校验成功后构造。
#[derive(Debug, Clone)]
pub struct AuthContext {
    // 当前请求的认证主体
    pub subject: Subject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_rejects_blank() {
        assert!(Subject::new("").is_none());
        assert!(Subject::new("   ").is_none());
        assert_eq!(Subject::new("user_1").map(|s| s.to_string()), Some("user_1".into()));
    }
}
