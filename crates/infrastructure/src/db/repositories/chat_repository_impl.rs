use application::ChatRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Chat, ChatId, ChatKind, LinkMeta, Message, MessageId, Nickname, Reaction, RepositoryError,
};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::repositories::map_sqlx_error;
use crate::db::DbPool;

/// 数据库会话模型。成员与消息在各自的表里，读取时装配回一个聚合。
#[derive(Debug, Clone, FromRow)]
struct DbChat {
    id: Uuid,
    kind: String,
    title: String,
    avatar: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbMessage {
    id: Uuid,
    author: String,
    date: DateTime<Utc>,
    text: String,
    meta: Option<Json<LinkMeta>>,
    reactions: Json<Vec<Reaction>>,
    attachments: Vec<String>,
}

impl DbMessage {
    fn try_into_message(self) -> Result<Message, RepositoryError> {
        let author = Nickname::parse(self.author)
            .map_err(|err| RepositoryError::storage(format!("corrupt message row: {err}")))?;
        Ok(Message {
            id: MessageId::from(self.id),
            author,
            date: self.date,
            text: self.text,
            meta: self.meta.map(|Json(meta)| meta),
            reactions: self.reactions.0,
            attachments: self.attachments,
        })
    }
}

fn parse_kind(kind: &str) -> Result<ChatKind, RepositoryError> {
    ChatKind::parse(kind)
        .map_err(|err| RepositoryError::storage(format!("corrupt chat row: {err}")))
}

fn parse_member(nickname: String) -> Result<Nickname, RepositoryError> {
    Nickname::parse(nickname)
        .map_err(|err| RepositoryError::storage(format!("corrupt member row: {err}")))
}

pub struct PgChatRepository {
    pool: DbPool,
}

impl PgChatRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 把会话行装配成完整聚合：成员按加入顺序，消息按追加顺序。
    async fn hydrate(&self, row: DbChat) -> Result<Chat, RepositoryError> {
        let member_rows: Vec<(String,)> = sqlx::query_as(
            "SELECT nickname FROM chat_members WHERE chat_id = $1 ORDER BY ordinal",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut members = Vec::with_capacity(member_rows.len());
        for (nickname,) in member_rows {
            members.push(parse_member(nickname)?);
        }

        let message_rows: Vec<DbMessage> = sqlx::query_as(
            "SELECT id, author, date, text, meta, reactions, attachments \
             FROM messages WHERE chat_id = $1 ORDER BY seq",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut messages = Vec::with_capacity(message_rows.len());
        for message in message_rows {
            messages.push(message.try_into_message()?);
        }

        Ok(Chat {
            id: ChatId::from(row.id),
            kind: parse_kind(&row.kind)?,
            title: row.title,
            members,
            avatar: row.avatar,
            messages,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn create(&self, chat: Chat) -> Result<Chat, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let kind = match chat.kind {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
        };
        sqlx::query(
            "INSERT INTO chats (id, kind, title, avatar, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::from(chat.id))
        .bind(kind)
        .bind(&chat.title)
        .bind(&chat.avatar)
        .bind(chat.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        for member in &chat.members {
            sqlx::query("INSERT INTO chat_members (chat_id, nickname) VALUES ($1, $2)")
                .bind(Uuid::from(chat.id))
                .bind(member.as_str())
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(chat)
    }

    async fn find_by_id(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError> {
        let row: Option<DbChat> = sqlx::query_as(
            "SELECT id, kind, title, avatar, created_at FROM chats WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_for_member(&self, nickname: &Nickname) -> Result<Vec<Chat>, RepositoryError> {
        let rows: Vec<DbChat> = sqlx::query_as(
            "SELECT c.id, c.kind, c.title, c.avatar, c.created_at \
             FROM chats c \
             JOIN chat_members m ON m.chat_id = c.id \
             WHERE m.nickname = $1 \
             ORDER BY c.created_at",
        )
        .bind(nickname.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut chats = Vec::with_capacity(rows.len());
        for row in rows {
            chats.push(self.hydrate(row).await?);
        }
        Ok(chats)
    }

    async fn set_title(&self, id: ChatId, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chats SET title = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(title)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_avatar(&self, id: ChatId, avatar: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chats SET avatar = $2 WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(avatar)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_member(&self, id: ChatId, nickname: &Nickname) -> Result<(), RepositoryError> {
        // 单语句 + 冲突即忽略：重复添加天然幂等
        sqlx::query(
            "INSERT INTO chat_members (chat_id, nickname) VALUES ($1, $2) \
             ON CONFLICT (chat_id, nickname) DO NOTHING",
        )
        .bind(Uuid::from(id))
        .bind(nickname.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn remove_member(
        &self,
        id: ChatId,
        nickname: &Nickname,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chat_members WHERE chat_id = $1 AND nickname = $2")
            .bind(Uuid::from(id))
            .bind(nickname.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn append_message(&self, id: ChatId, message: Message) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO messages (id, chat_id, author, date, text, meta, reactions, attachments) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::from(message.id))
        .bind(Uuid::from(id))
        .bind(message.author.as_str())
        .bind(message.date)
        .bind(&message.text)
        .bind(message.meta.as_ref().map(Json))
        .bind(Json(&message.reactions))
        .bind(&message.attachments)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }
}
