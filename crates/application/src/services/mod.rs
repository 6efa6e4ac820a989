mod chat_service;
mod message_service;
mod user_service;

pub use chat_service::{ChatService, ChatServiceDependencies, CreateChatRequest};
pub use message_service::{MessageService, MessageServiceDependencies, PostMessageRequest};
pub use user_service::{UserService, UserServiceDependencies};

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod chat_service_tests;
