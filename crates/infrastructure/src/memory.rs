//! 内存仓储实现。
//!
//! 供集成测试在没有 PostgreSQL 的环境下装配完整服务栈使用，
//! 行为与 Pg 实现保持一致（幂等成员变更、创建顺序、冲突检测）。

use std::collections::HashMap;

use application::{ChatRepository, UserRepository};
use async_trait::async_trait;
use domain::{Chat, ChatId, Message, Nickname, RepositoryError, User};
use tokio::sync::RwLock;
use uuid::Uuid;

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
        Ok(self.data.read().await.get(nickname.as_str()).cloned())
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
        mutate: impl FnOnce(&mut Chat) -> T + Send,
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
        Ok(self.data.read().await.get(&Uuid::from(id)).cloned())
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
