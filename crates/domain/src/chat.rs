use crate::errors::{DomainError, DomainResult};
use crate::message::Message;
use crate::value_objects::{ChatId, Nickname, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
}

impl ChatKind {
    /// 解析来自客户端的类型字符串。未知取值属于 400，而不是反序列化失败。
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "private" => Ok(Self::Private),
            "group" => Ok(Self::Group),
            other => Err(DomainError::invalid_argument(
                "type",
                format!("unknown chat type '{other}'"),
            )),
        }
    }
}

/// 会话：成员制访问控制的聚合根，消息序列归其独占所有。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub title: String,
    pub members: Vec<Nickname>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub messages: Vec<Message>,
    pub created_at: Timestamp,
}

impl Chat {
    /// 私聊：恰好两名成员，成员集不可变更，无头像。
    pub fn private(
        id: ChatId,
        title: impl Into<String>,
        members: Vec<Nickname>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let members = dedup_members(members)?;
        if members.len() != 2 {
            return Err(DomainError::invalid_argument(
                "members",
                "private chat requires exactly two members",
            ));
        }
        Ok(Self {
            id,
            kind: ChatKind::Private,
            title: title.into(),
            members,
            avatar: None,
            messages: Vec::new(),
            created_at: now,
        })
    }

    /// 群聊：至少一名成员，成员、标题、头像均可变更。
    pub fn group(
        id: ChatId,
        title: impl Into<String>,
        members: Vec<Nickname>,
        avatar: impl Into<String>,
        now: Timestamp,
    ) -> DomainResult<Self> {
        let members = dedup_members(members)?;
        Ok(Self {
            id,
            kind: ChatKind::Group,
            title: title.into(),
            members,
            avatar: Some(avatar.into()),
            messages: Vec::new(),
            created_at: now,
        })
    }

    pub fn is_member(&self, nickname: &Nickname) -> bool {
        self.members.contains(nickname)
    }

    /// 成员制门禁：所有读写操作先过这里。
    pub fn ensure_member(&self, nickname: &Nickname) -> DomainResult<()> {
        if self.is_member(nickname) {
            Ok(())
        } else {
            Err(DomainError::NotAMember)
        }
    }

    /// 重复添加按幂等成功处理。
    pub fn add_member(&mut self, nickname: Nickname) -> DomainResult<()> {
        if self.kind == ChatKind::Private {
            return Err(DomainError::PrivateChatImmutable);
        }
        if !self.members.contains(&nickname) {
            self.members.push(nickname);
        }
        Ok(())
    }

    pub fn remove_member(&mut self, nickname: &Nickname) -> DomainResult<()> {
        if self.kind == ChatKind::Private {
            return Err(DomainError::PrivateChatImmutable);
        }
        self.members.retain(|m| m != nickname);
        Ok(())
    }

    pub fn rename(&mut self, title: impl Into<String>) -> DomainResult<()> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::invalid_argument("title", "cannot be empty"));
        }
        self.title = title;
        Ok(())
    }

    pub fn set_avatar(&mut self, avatar: impl Into<String>) -> DomainResult<()> {
        if self.kind == ChatKind::Private {
            return Err(DomainError::invalid_argument(
                "avatar",
                "not applicable to private chats",
            ));
        }
        self.avatar = Some(avatar.into());
        Ok(())
    }
}

/// 成员表是集合语义：去重保序，且不允许为空。
fn dedup_members(members: Vec<Nickname>) -> DomainResult<Vec<Nickname>> {
    if members.is_empty() {
        return Err(DomainError::invalid_argument("members", "cannot be empty"));
    }
    let mut seen = Vec::with_capacity(members.len());
    for member in members {
        if !seen.contains(&member) {
            seen.push(member);
        }
    }
    Ok(seen)
}
