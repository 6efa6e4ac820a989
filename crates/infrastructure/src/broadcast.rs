use application::{BroadcastError, EventBroadcaster};
use async_trait::async_trait;
use domain::ChatEvent;
use tokio::sync::broadcast;

/// 单进程事件广播器。
///
/// WebSocket 连接各自订阅一份接收端，按房间过滤后下发。
#[derive(Clone)]
pub struct LocalEventBroadcaster {
    sender: broadcast::Sender<ChatEvent>,
}

impl LocalEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventBroadcaster for LocalEventBroadcaster {
    async fn publish(&self, event: ChatEvent) -> Result<(), BroadcastError> {
        // 没有任何在线连接不算失败
        if self.sender.receiver_count() == 0 {
            return Ok(());
        }
        self.sender
            .send(event)
            .map_err(|err| BroadcastError::failed(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Chat, ChatId, Nickname};
    use uuid::Uuid;

    fn sample_chat() -> Chat {
        Chat::private(
            ChatId::from(Uuid::new_v4()),
            "t",
            vec![
                Nickname::parse("a").unwrap(),
                Nickname::parse("b").unwrap(),
            ],
            chrono::Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_success() {
        let broadcaster = LocalEventBroadcaster::new(16);

        let result = broadcaster
            .publish(ChatEvent::chat_created(sample_chat()))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let broadcaster = LocalEventBroadcaster::new(16);
        let mut receiver = broadcaster.subscribe();
        let chat = sample_chat();

        broadcaster
            .publish(ChatEvent::chat_created(chat.clone()))
            .await
            .unwrap();

        match receiver.recv().await.unwrap() {
            ChatEvent::Chat { chat: received } => assert_eq!(received.id, chat.id),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
