//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、访问控制、
//! 以及对外部适配器（头像存储、正文清洗、链接预览、事件广播）的抽象。

pub mod avatars;
pub mod broadcaster;
pub mod clock;
pub mod error;
pub mod image_store;
pub mod link_meta;
pub mod repository;
pub mod sanitizer;
pub mod services;

pub use avatars::AvatarGenerator;
pub use broadcaster::{BroadcastError, EventBroadcaster};
pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use image_store::{ImageStore, ImageStoreError, ImageUpload};
pub use link_meta::MetaExtractor;
pub use repository::{ChatRepository, UserRepository};
pub use sanitizer::{MessageSanitizer, SanitizeError};
pub use services::{
    ChatService, ChatServiceDependencies, CreateChatRequest, MessageService,
    MessageServiceDependencies, PostMessageRequest, UserService, UserServiceDependencies,
};
