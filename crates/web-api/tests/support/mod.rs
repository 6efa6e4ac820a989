//! 集成测试装配：内存仓储 + 真实清洗器 + 本地广播器。
//! 不需要 PostgreSQL，也不触达任何外部服务。

use std::sync::Arc;

use application::{
    AvatarGenerator, ChatService, ChatServiceDependencies, ImageStore, ImageStoreError,
    ImageUpload, MessageService, MessageServiceDependencies, MetaExtractor, SystemClock,
    UserService, UserServiceDependencies,
};
use async_trait::async_trait;
use axum::Router;
use domain::LinkMeta;
use infrastructure::{
    AmmoniaSanitizer, InMemoryChatRepository, InMemoryUserRepository, LocalEventBroadcaster,
};
use web_api::{router, AppState};

/// 测试替身：CDN 上传只返回可预测的 URL。
struct StaticImageStore;

#[async_trait]
impl ImageStore for StaticImageStore {
    async fn upload(
        &self,
        _image: &ImageUpload,
        public_id: &str,
    ) -> Result<String, ImageStoreError> {
        Ok(format!("https://cdn.test/image/upload/{public_id}"))
    }
}

/// 测试替身：不出网的链接预览。
struct NoLinkMeta;

#[async_trait]
impl MetaExtractor for NoLinkMeta {
    async fn extract(&self, _text: &str) -> Option<LinkMeta> {
        None
    }
}

struct SeedAvatars;

impl AvatarGenerator for SeedAvatars {
    fn avatar_url(&self, seed: &str) -> String {
        format!("https://avatars.test/{seed}.svg")
    }
}

pub fn build_router() -> Router {
    let user_repository = Arc::new(InMemoryUserRepository::default());
    let chat_repository = Arc::new(InMemoryChatRepository::default());
    let clock = Arc::new(SystemClock);
    let broadcaster = Arc::new(LocalEventBroadcaster::new(64));
    let image_store = Arc::new(StaticImageStore);
    let avatar_generator = Arc::new(SeedAvatars);

    let user_service = UserService::new(UserServiceDependencies {
        user_repository: user_repository.clone(),
        image_store: image_store.clone(),
        avatar_generator: avatar_generator.clone(),
        clock: clock.clone(),
    });

    let chat_service = ChatService::new(ChatServiceDependencies {
        chat_repository: chat_repository.clone(),
        user_repository,
        image_store,
        avatar_generator,
        broadcaster: broadcaster.clone(),
        clock: clock.clone(),
    });

    let message_service = MessageService::new(MessageServiceDependencies {
        chat_repository,
        sanitizer: Arc::new(AmmoniaSanitizer),
        meta_extractor: Arc::new(NoLinkMeta),
        broadcaster: broadcaster.clone(),
        clock,
    });

    let state = AppState::new(
        Arc::new(user_service),
        Arc::new(chat_service),
        Arc::new(message_service),
        broadcaster,
    );

    router(state)
}
