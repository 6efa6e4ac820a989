use std::sync::Arc;

use domain::{Chat, ChatEvent, ChatId, DomainError, Message, MessageId};
use uuid::Uuid;

use crate::{
    broadcaster::EventBroadcaster, clock::Clock, error::ApplicationError,
    link_meta::MetaExtractor, repository::ChatRepository, sanitizer::MessageSanitizer,
    services::user_service::resolve_identity,
};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    pub chat_id: String,
    pub text: String,
    pub attachments: Vec<String>,
}

pub struct MessageServiceDependencies {
    pub chat_repository: Arc<dyn ChatRepository>,
    pub sanitizer: Arc<dyn MessageSanitizer>,
    pub meta_extractor: Arc<dyn MetaExtractor>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn post_message(
        &self,
        request: PostMessageRequest,
        author: Option<&str>,
    ) -> Result<Message, ApplicationError> {
        let author = resolve_identity(author)?;
        let chat_id = ChatId::parse(&request.chat_id)?;
        let chat = self.load(chat_id).await?;
        chat.ensure_member(&author)?;

        // 预览提取在清洗之前，作用于原始正文；失败退化为空
        let meta = self.deps.meta_extractor.extract(&request.text).await;
        let text = self.deps.sanitizer.sanitize(&request.text)?;

        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            author,
            text,
            meta,
            request.attachments,
            self.deps.clock.now(),
        );

        self.deps
            .chat_repository
            .append_message(chat_id, message.clone())
            .await?;

        if let Err(err) = self
            .deps
            .broadcaster
            .publish(ChatEvent::message_appended(chat_id, message.clone()))
            .await
        {
            tracing::debug!(chat_id = %chat_id, error = %err, "no live sessions received the message");
        }

        Ok(message)
    }

    pub async fn list_messages(
        &self,
        chat_id: &str,
        requester: Option<&str>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let requester = resolve_identity(requester)?;
        let chat_id = ChatId::parse(chat_id)?;
        let chat = self.load(chat_id).await?;
        chat.ensure_member(&requester)?;

        // 已按创建顺序存储，正文不做二次清洗
        Ok(chat.messages)
    }

    async fn load(&self, id: ChatId) -> Result<Chat, ApplicationError> {
        self.deps
            .chat_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ChatNotFound.into())
    }
}
