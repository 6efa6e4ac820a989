use crate::chat::Chat;
use crate::message::Message;
use crate::value_objects::ChatId;

/// 领域事件：实体变更与实时下发的解耦点。
///
/// 实体服务在持久化成功后发布事件，传输层订阅者负责送达在线会话。
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChatEvent {
    /// 新会话已创建，需通知所有成员的在线会话。
    Chat { chat: Chat },
    /// 会话新增一条消息，需通知该会话房间内的在线会话。
    Message { chat_id: ChatId, message: Message },
}

impl ChatEvent {
    pub fn chat_created(chat: Chat) -> Self {
        Self::Chat { chat }
    }

    pub fn message_appended(chat_id: ChatId, message: Message) -> Self {
        Self::Message { chat_id, message }
    }
}
