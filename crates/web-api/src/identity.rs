use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// 上游认证中间件注入的受信身份头。
pub const IDENTITY_HEADER: &str = "x-messenger-user";

/// 请求附带的调用者身份。
///
/// 缺失不是提取失败：是否放行由各操作自行决定（读写会话要求在场，
/// 用户自注册等操作不要求）。
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let nickname = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);
        Ok(Self(nickname))
    }
}
