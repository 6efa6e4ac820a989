use async_trait::async_trait;
use domain::{Chat, ChatId, Message, Nickname, RepositoryError, User};

/// 用户目录存储。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 昵称已占用时返回 `RepositoryError::Conflict`。
    async fn insert(&self, user: User) -> Result<User, RepositoryError>;
    async fn find(&self, nickname: &Nickname) -> Result<Option<User>, RepositoryError>;
    /// 用户不存在时返回 `RepositoryError::NotFound`。
    async fn set_avatar(&self, nickname: &Nickname, avatar: &str)
        -> Result<User, RepositoryError>;
    /// 昵称子串匹配，大小写不敏感。
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<User>, RepositoryError>;
}

/// 会话文档存储。成员表与消息序列是会话的子资源，没有独立生命周期，
/// 因此统一挂在这一个仓储上；每个方法都是对单个会话文档的原子操作。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// 会话及其初始成员作为一个事务落库。
    async fn create(&self, chat: Chat) -> Result<Chat, RepositoryError>;
    async fn find_by_id(&self, id: ChatId) -> Result<Option<Chat>, RepositoryError>;
    /// 服务端按成员过滤，绝不信任客户端给的过滤条件。
    async fn list_for_member(&self, nickname: &Nickname) -> Result<Vec<Chat>, RepositoryError>;
    async fn set_title(&self, id: ChatId, title: &str) -> Result<(), RepositoryError>;
    async fn set_avatar(&self, id: ChatId, avatar: &str) -> Result<(), RepositoryError>;
    /// 重复添加是幂等成功。
    async fn add_member(&self, id: ChatId, nickname: &Nickname) -> Result<(), RepositoryError>;
    async fn remove_member(&self, id: ChatId, nickname: &Nickname)
        -> Result<(), RepositoryError>;
    /// 单语句追加，并发写同一会话依赖存储层原子性，不做应用级加锁。
    async fn append_message(&self, id: ChatId, message: Message)
        -> Result<(), RepositoryError>;
}
