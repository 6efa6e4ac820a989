use crate::value_objects::{MessageId, Nickname, Timestamp};

/// 从正文首个链接提取的预览元数据。尽力而为，缺省为空。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkMeta {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// 消息上的表情回应。对核心不变量不透明，仅随消息存储与下发。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Reaction {
    pub author: Nickname,
    pub emoji: String,
    pub date: Timestamp,
}

/// 消息。仅通过「向会话追加」创建，创建后除 reactions 外不可变。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: Nickname,
    pub date: Timestamp,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<LinkMeta>,
    pub reactions: Vec<Reaction>,
    pub attachments: Vec<String>,
}

impl Message {
    /// `text` 必须已经过白名单清洗，时间戳由服务端指定。
    pub fn new(
        id: MessageId,
        author: Nickname,
        text: impl Into<String>,
        meta: Option<LinkMeta>,
        attachments: Vec<String>,
        date: Timestamp,
    ) -> Self {
        Self {
            id,
            author,
            date,
            text: text.into(),
            meta,
            reactions: Vec::new(),
            attachments,
        }
    }
}
