//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP / WebSocket 请求委托给应用层的用例服务。
//! 身份由上游中间件以受信请求头注入，这里只区分「有」和「没有」。

mod error;
mod identity;
mod routes;
mod state;
mod ws_connection;

pub use error::ApiError;
pub use identity::{CurrentUser, IDENTITY_HEADER};
pub use routes::router;
pub use state::AppState;
