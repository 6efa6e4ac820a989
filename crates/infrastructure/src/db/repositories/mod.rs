mod chat_repository_impl;
mod user_repository_impl;

pub use chat_repository_impl::PgChatRepository;
pub use user_repository_impl::PgUserRepository;

use domain::RepositoryError;

/// sqlx 错误到存储层错误的统一换算。
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::NotFound
        }
        _ => RepositoryError::storage(err.to_string()),
    }
}
