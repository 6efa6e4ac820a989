use crate::value_objects::{Nickname, Timestamp};

/// 用户目录条目。昵称即主键，首次被 API 引用时创建。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub nickname: Nickname,
    pub avatar: String,
    pub created_at: Timestamp,
}

impl User {
    /// 注册新用户。头像由调用方生成（对昵称确定性推导）。
    pub fn register(nickname: Nickname, avatar: impl Into<String>, now: Timestamp) -> Self {
        Self {
            nickname,
            avatar: avatar.into(),
            created_at: now,
        }
    }

    /// 昵称之外唯一可变的字段。
    pub fn set_avatar(&mut self, avatar: impl Into<String>) {
        self.avatar = avatar.into();
    }
}
