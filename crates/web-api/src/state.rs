use std::sync::Arc;

use application::{ChatService, MessageService, UserService};
use infrastructure::LocalEventBroadcaster;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub chat_service: Arc<ChatService>,
    pub message_service: Arc<MessageService>,
    pub broadcaster: Arc<LocalEventBroadcaster>,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        chat_service: Arc<ChatService>,
        message_service: Arc<MessageService>,
        broadcaster: Arc<LocalEventBroadcaster>,
    ) -> Self {
        Self {
            user_service,
            chat_service,
            message_service,
            broadcaster,
        }
    }
}
