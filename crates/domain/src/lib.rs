//! 信使系统核心领域模型
//!
//! 包含用户、会话、消息等核心实体，以及成员制访问控制的业务规则。

pub mod chat;
pub mod errors;
pub mod events;
pub mod message;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use chat::*;
pub use errors::*;
pub use events::*;
pub use message::*;
pub use user::*;
pub use value_objects::*;
