use async_trait::async_trait;
use domain::ChatEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 领域事件广播端口。
///
/// 投递相对 HTTP 响应是 fire-and-forget：没有在线订阅者不算失败，
/// 离线成员下次连接时通过 list_chats / list_messages 补齐历史。
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    async fn publish(&self, event: ChatEvent) -> Result<(), BroadcastError>;
}
