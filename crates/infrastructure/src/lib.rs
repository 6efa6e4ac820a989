//! 基础设施层。
//!
//! 应用层端口的具体适配：PostgreSQL 仓储、本地事件广播、
//! ammonia 正文清洗、链接预览抓取、Cloudinary 图片存储、生成头像。

pub mod avatars;
pub mod broadcast;
pub mod cloudinary;
pub mod db;
pub mod link_meta;
pub mod memory;
pub mod sanitizer;

pub use avatars::IdenticonAvatars;
pub use broadcast::LocalEventBroadcaster;
pub use cloudinary::{CloudinaryConfig, CloudinaryImageStore};
pub use db::repositories::{PgChatRepository, PgUserRepository};
pub use db::{create_pg_pool, DbPool};
pub use link_meta::HttpMetaExtractor;
pub use memory::{InMemoryChatRepository, InMemoryUserRepository};
pub use sanitizer::AmmoniaSanitizer;
