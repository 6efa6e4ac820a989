use std::sync::Arc;

use domain::{Chat, ChatEvent, ChatId, ChatKind, DomainError, Nickname};
use uuid::Uuid;

use crate::{
    avatars::AvatarGenerator,
    broadcaster::EventBroadcaster,
    clock::Clock,
    error::ApplicationError,
    image_store::{ImageStore, ImageUpload},
    repository::{ChatRepository, UserRepository},
    services::user_service::{ensure_user_record, resolve_identity},
};

#[derive(Debug, Clone)]
pub struct CreateChatRequest {
    /// 原样透传客户端字符串，未知取值在这里换成 400 而不是反序列化错误。
    pub kind: String,
    pub title: String,
    pub members: Option<Vec<String>>,
}

pub struct ChatServiceDependencies {
    pub chat_repository: Arc<dyn ChatRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub image_store: Arc<dyn ImageStore>,
    pub avatar_generator: Arc<dyn AvatarGenerator>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_chat(&self, request: CreateChatRequest) -> Result<Chat, ApplicationError> {
        let members = request
            .members
            .filter(|m| !m.is_empty())
            .ok_or_else(|| DomainError::invalid_argument("members", "cannot be empty"))?;

        let kind = ChatKind::parse(&request.kind)?;

        let mut nicknames = Vec::with_capacity(members.len());
        for member in members {
            nicknames.push(Nickname::parse(member)?);
        }

        // 先把所有不变量检查完，再产生任何写入
        let id = ChatId::from(Uuid::new_v4());
        let now = self.deps.clock.now();
        let chat = match kind {
            ChatKind::Private => Chat::private(id, request.title, nicknames, now)?,
            ChatKind::Group => {
                let avatar = self.deps.avatar_generator.avatar_url(&id.to_string());
                Chat::group(id, request.title, nicknames, avatar, now)?
            }
        };

        // 成员必须存在于用户目录：沿用「首次引用即创建」的幂等语义
        for nickname in &chat.members {
            ensure_user_record(
                self.deps.user_repository.as_ref(),
                self.deps.avatar_generator.as_ref(),
                self.deps.clock.as_ref(),
                nickname.clone(),
            )
            .await?;
        }

        let stored = self.deps.chat_repository.create(chat).await?;
        self.publish(ChatEvent::chat_created(stored.clone())).await;
        Ok(stored)
    }

    pub async fn list_chats(&self, for_user: Option<&str>) -> Result<Vec<Chat>, ApplicationError> {
        let nickname = resolve_identity(for_user)?;
        Ok(self.deps.chat_repository.list_for_member(&nickname).await?)
    }

    pub async fn update_title(
        &self,
        chat_id: &str,
        title: &str,
    ) -> Result<Chat, ApplicationError> {
        let id = ChatId::parse(chat_id)?;
        let mut chat = self.load(id).await?;

        chat.rename(title)?;
        self.deps.chat_repository.set_title(id, &chat.title).await?;
        Ok(chat)
    }

    pub async fn update_avatar(
        &self,
        chat_id: &str,
        image: ImageUpload,
    ) -> Result<Chat, ApplicationError> {
        let id = ChatId::parse(chat_id)?;
        let mut chat = self.load(id).await?;

        // 不变量全部校验通过之后才触达外部存储
        if chat.kind == ChatKind::Private {
            return Err(DomainError::invalid_argument(
                "avatar",
                "not applicable to private chats",
            )
            .into());
        }
        image.validate()?;

        let url = self
            .deps
            .image_store
            .upload(&image, &format!("chat_{id}"))
            .await?;
        chat.set_avatar(url.clone())?;
        self.deps.chat_repository.set_avatar(id, &url).await?;
        Ok(chat)
    }

    pub async fn add_member(
        &self,
        chat_id: &str,
        nickname: &str,
    ) -> Result<Chat, ApplicationError> {
        let id = ChatId::parse(chat_id)?;
        let mut chat = self.load(id).await?;
        let nickname = Nickname::parse(nickname)?;

        // 与创建会话不同：这里的未知用户是 400，不做隐式注册
        if self.deps.user_repository.find(&nickname).await?.is_none() {
            return Err(DomainError::UserNotFound.into());
        }

        chat.add_member(nickname.clone())?;
        self.deps.chat_repository.add_member(id, &nickname).await?;
        Ok(chat)
    }

    pub async fn remove_member(
        &self,
        chat_id: &str,
        nickname: &str,
    ) -> Result<Chat, ApplicationError> {
        let id = ChatId::parse(chat_id)?;
        let mut chat = self.load(id).await?;
        let nickname = Nickname::parse(nickname)?;

        chat.remove_member(&nickname)?;
        self.deps
            .chat_repository
            .remove_member(id, &nickname)
            .await?;
        Ok(chat)
    }

    async fn load(&self, id: ChatId) -> Result<Chat, ApplicationError> {
        self.deps
            .chat_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::ChatNotFound.into())
    }

    /// 写库成功后的实时下发。没有在线订阅者不是错误。
    async fn publish(&self, event: ChatEvent) {
        if let Err(err) = self.deps.broadcaster.publish(event).await {
            tracing::debug!(error = %err, "no live sessions received the event");
        }
    }
}
