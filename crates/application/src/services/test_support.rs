//! 服务单元测试共用的内存实现与测试替身。

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use domain::{
    Chat, ChatEvent, ChatId, LinkMeta, Message, Nickname, RepositoryError, Timestamp, User,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    avatars::AvatarGenerator,
    broadcaster::{BroadcastError, EventBroadcaster},
    clock::Clock,
    image_store::{ImageStore, ImageStoreError, ImageUpload},
    link_meta::MetaExtractor,
    repository::{ChatRepository, UserRepository},
    sanitizer::{MessageSanitizer, SanitizeError},
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    data: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.data.write().await;
        let key = user.nickname.to_string();
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, user.clone());
        Ok(user)
    }

    async fn find(&self, nickname: &Nickname) -> Result<Option<User>, RepositoryError> {
        let guard = self.data.read().await;
        Ok(guard.get(nickname.as_str()).cloned())
    }

    async fn set_avatar(
        &self,
        nickname: &Nickname,
        avatar: &str,
    ) -> Result<User, RepositoryError> {
        let mut guard = self.data.write().await;
        let user = guard
            .get_mut(nickname.as_str())
            .ok_or(RepositoryError::NotFound)?;
        user.set_avatar(avatar);
        Ok(user.clone())
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let guard = self.data.read().await;
        let needle = query.to_lowercase();
        let mut found: Vec<User> = guard
            .values()
            .filter(|u| u.nickname.as_str().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryChatRepository {
    data: RwLock<HashMap<Uuid, Chat>>,
}

impl InMemoryChatRepository {
    async fn with_chat<T>(
        &self,
        id: ChatId,
        mutate: impl FnOnce(&mut Chat) -> T,
    ) -> Result<T, RepositoryError> {
        let mut guard = self.data.write().await;
        let chat = guard
            .get_mut(&Uuid::from(id))
            .ok_or(RepositoryError::NotFound)?;
        Ok(mutate(chat))
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn create(&self, chat: Chat) -> Result<Chat, RepositoryError> {
        let mut guard = self.data.write().await;
        let id = Uuid::from(chat.id);
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(id, chat.clone());
        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError> {
        let guard = self.data.read().await;
        Ok(guard.get(&Uuid::from(id)).cloned())
    }

    async fn list_for_member(&self, nickname: &Nickname) -> Result<Vec<Chat>, RepositoryError> {
        let guard = self.data.read().await;
        let mut chats: Vec<Chat> = guard
            .values()
            .filter(|c| c.is_member(nickname))
            .cloned()
            .collect();
        chats.sort_by_key(|c| c.created_at);
        Ok(chats)
    }

    async fn set_title(&self, id: ChatId, title: &str) -> Result<(), RepositoryError> {
        self.with_chat(id, |chat| chat.title = title.to_owned()).await
    }

    async fn set_avatar(&self, id: ChatId, avatar: &str) -> Result<(), RepositoryError> {
        self.with_chat(id, |chat| chat.avatar = Some(avatar.to_owned()))
            .await
    }

    async fn add_member(&self, id: ChatId, nickname: &Nickname) -> Result<(), RepositoryError> {
        self.with_chat(id, |chat| {
            if !chat.members.contains(nickname) {
                chat.members.push(nickname.clone());
            }
        })
        .await
    }

    async fn remove_member(
        &self,
        id: ChatId,
        nickname: &Nickname,
    ) -> Result<(), RepositoryError> {
        self.with_chat(id, |chat| chat.members.retain(|m| m != nickname))
            .await
    }

    async fn append_message(&self, id: ChatId, message: Message) -> Result<(), RepositoryError> {
        self.with_chat(id, |chat| chat.messages.push(message)).await
    }
}

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

pub fn fixed_now() -> Timestamp {
    chrono::DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc)
}

/// 记录所有已发布事件，供断言实时下发行为。
#[derive(Default)]
pub struct RecordingBroadcaster {
    pub events: Mutex<Vec<ChatEvent>>,
}

#[async_trait]
impl EventBroadcaster for RecordingBroadcaster {
    async fn publish(&self, event: ChatEvent) -> Result<(), BroadcastError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// 大写替身：证明落库的是清洗结果而不是原文。
pub struct ShoutingSanitizer;

impl MessageSanitizer for ShoutingSanitizer {
    fn sanitize(&self, raw: &str) -> Result<String, SanitizeError> {
        Ok(raw.to_uppercase())
    }
}

pub struct FailingSanitizer;

impl MessageSanitizer for FailingSanitizer {
    fn sanitize(&self, _raw: &str) -> Result<String, SanitizeError> {
        Err(SanitizeError::Failed("boom".into()))
    }
}

pub struct NoLinkMeta;

#[async_trait]
impl MetaExtractor for NoLinkMeta {
    async fn extract(&self, _text: &str) -> Option<LinkMeta> {
        None
    }
}

pub struct StaticLinkMeta(pub LinkMeta);

#[async_trait]
impl MetaExtractor for StaticLinkMeta {
    async fn extract(&self, _text: &str) -> Option<LinkMeta> {
        Some(self.0.clone())
    }
}

pub struct StaticImageStore;

#[async_trait]
impl ImageStore for StaticImageStore {
    async fn upload(
        &self,
        _image: &ImageUpload,
        public_id: &str,
    ) -> Result<String, ImageStoreError> {
        Ok(format!("https://cdn.test/image/upload/{public_id}"))
    }
}

pub struct FailingImageStore;

#[async_trait]
impl ImageStore for FailingImageStore {
    async fn upload(
        &self,
        _image: &ImageUpload,
        _public_id: &str,
    ) -> Result<String, ImageStoreError> {
        Err(ImageStoreError::Upload("cdn unreachable".into()))
    }
}

pub struct SeedAvatars;

impl AvatarGenerator for SeedAvatars {
    fn avatar_url(&self, seed: &str) -> String {
        format!("https://avatars.test/{seed}.svg")
    }
}

pub fn png_upload() -> ImageUpload {
    ImageUpload::new(vec![0x89, 0x50, 0x4e, 0x47], "image/png")
}
