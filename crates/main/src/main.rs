//! 主应用程序入口
//!
//! 装配存储、适配器与用例服务，启动 Axum Web 服务。

use std::sync::Arc;

use application::{
    ChatService, ChatServiceDependencies, MessageService, MessageServiceDependencies,
    SystemClock, UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, AmmoniaSanitizer, CloudinaryConfig, CloudinaryImageStore, HttpMetaExtractor,
    IdenticonAvatars, LocalEventBroadcaster, PgChatRepository, PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "connecting to database: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );
    let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let chat_repository = Arc::new(PgChatRepository::new(pool));

    let clock = Arc::new(SystemClock);
    let broadcaster = Arc::new(LocalEventBroadcaster::new(config.broadcast.capacity));
    let image_store = Arc::new(CloudinaryImageStore::new(CloudinaryConfig {
        cloud_name: config.media.cloud_name.clone(),
        upload_preset: config.media.upload_preset.clone(),
    }));
    let avatar_generator = Arc::new(IdenticonAvatars::new(config.avatars.base_url.clone()));

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
        meta_extractor: Arc::new(HttpMetaExtractor::new()),
        broadcaster: broadcaster.clone(),
        clock,
    });

    let state = AppState::new(
        Arc::new(user_service),
        Arc::new(chat_service),
        Arc::new(message_service),
        broadcaster,
    );

    let app = router(state);
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("messenger server listening on http://{address}");
    axum::serve(listener, app).await?;

    Ok(())
}
