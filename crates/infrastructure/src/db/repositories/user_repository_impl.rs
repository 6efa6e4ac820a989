use application::UserRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Nickname, RepositoryError, User};
use sqlx::FromRow;

use crate::db::repositories::map_sqlx_error;
use crate::db::DbPool;

/// 数据库用户模型
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    nickname: String,
    avatar: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = RepositoryError;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        let nickname = Nickname::parse(row.nickname)
            .map_err(|err| RepositoryError::storage(format!("corrupt user row: {err}")))?;
        Ok(User {
            nickname,
            avatar: row.avatar,
            created_at: row.created_at,
        })
    }
}

pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let row: DbUser = sqlx::query_as(
            "INSERT INTO users (nickname, avatar, created_at) \
             VALUES ($1, $2, $3) \
             RETURNING nickname, avatar, created_at",
        )
        .bind(user.nickname.as_str())
        .bind(&user.avatar)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn find(&self, nickname: &Nickname) -> Result<Option<User>, RepositoryError> {
        let row: Option<DbUser> = sqlx::query_as(
            "SELECT nickname, avatar, created_at FROM users WHERE nickname = $1",
        )
        .bind(nickname.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_avatar(
        &self,
        nickname: &Nickname,
        avatar: &str,
    ) -> Result<User, RepositoryError> {
        let row: Option<DbUser> = sqlx::query_as(
            "UPDATE users SET avatar = $2 WHERE nickname = $1 \
             RETURNING nickname, avatar, created_at",
        )
        .bind(nickname.as_str())
        .bind(avatar)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<DbUser> = sqlx::query_as(
            "SELECT nickname, avatar, created_at FROM users \
             WHERE nickname ILIKE $1 ORDER BY nickname LIMIT $2",
        )
        .bind(format!("%{query}%"))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
