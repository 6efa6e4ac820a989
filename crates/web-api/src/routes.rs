use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use application::{CreateChatRequest, ImageUpload, PostMessageRequest};
use domain::{Chat, Message, User};

use crate::{error::ApiError, identity::CurrentUser, state::AppState, ws_connection};

#[derive(Debug, Deserialize)]
struct CreateChatPayload {
    #[serde(rename = "type")]
    kind: Option<String>,
    title: Option<String>,
    members: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct UpdateTitlePayload {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostMessagePayload {
    text: Option<String>,
    #[serde(default)]
    attachments: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .route("/socket", get(ws_connection::socket_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users/{nickname}", post(ensure_user).get(get_user))
        .route("/users/{nickname}/avatar", patch(update_user_avatar))
        .route("/search/users/{query}", get(search_users))
        .route("/chats", post(create_chat).get(list_chats))
        .route("/chats/{id}/avatar", patch(update_chat_avatar))
        .route("/chats/{id}/title", patch(update_chat_title))
        .route(
            "/chats/{id}/members/{nickname}",
            post(add_member).delete(remove_member),
        )
        .route(
            "/chats/{id}/messages",
            post(post_message).get(list_messages),
        )
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn ensure_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state.user_service.ensure_user(&nickname).await?;
    Ok(Json(user))
}

async fn get_user(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .user_service
        .find_user(&nickname)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("user not found"))
}

async fn update_user_avatar(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
    multipart: Multipart,
) -> Result<Json<User>, ApiError> {
    let image = read_image(multipart).await?;
    let user = state.user_service.update_avatar(&nickname, image).await?;
    Ok(Json(user))
}

async fn search_users(
    State(state): State<AppState>,
    Path(query): Path<String>,
    identity: CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state
        .user_service
        .search_users(&query, identity.as_deref())
        .await?;
    Ok(Json(users))
}

async fn create_chat(
    State(state): State<AppState>,
    Json(payload): Json<CreateChatPayload>,
) -> Result<Json<Chat>, ApiError> {
    let chat = state
        .chat_service
        .create_chat(CreateChatRequest {
            kind: payload.kind.unwrap_or_default(),
            title: payload.title.unwrap_or_default(),
            members: payload.members,
        })
        .await?;
    Ok(Json(chat))
}

async fn list_chats(
    State(state): State<AppState>,
    identity: CurrentUser,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let chats = state.chat_service.list_chats(identity.as_deref()).await?;
    Ok(Json(chats))
}

async fn update_chat_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Chat>, ApiError> {
    let image = read_image(multipart).await?;
    let chat = state.chat_service.update_avatar(&id, image).await?;
    Ok(Json(chat))
}

async fn update_chat_title(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTitlePayload>,
) -> Result<Json<Chat>, ApiError> {
    let chat = state
        .chat_service
        .update_title(&id, &payload.title.unwrap_or_default())
        .await?;
    Ok(Json(chat))
}

async fn add_member(
    State(state): State<AppState>,
    Path((id, nickname)): Path<(String, String)>,
) -> Result<Json<Chat>, ApiError> {
    let chat = state.chat_service.add_member(&id, &nickname).await?;
    Ok(Json(chat))
}

async fn remove_member(
    State(state): State<AppState>,
    Path((id, nickname)): Path<(String, String)>,
) -> Result<Json<Chat>, ApiError> {
    let chat = state.chat_service.remove_member(&id, &nickname).await?;
    Ok(Json(chat))
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    identity: CurrentUser,
    Json(payload): Json<PostMessagePayload>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .message_service
        .post_message(
            PostMessageRequest {
                chat_id: id,
                text: payload.text.unwrap_or_default(),
                attachments: payload.attachments,
            },
            identity.as_deref(),
        )
        .await?;
    Ok(Json(message))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    identity: CurrentUser,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state
        .message_service
        .list_messages(&id, identity.as_deref())
        .await?;
    Ok(Json(messages))
}

/// 取出 multipart 请求里第一个文件字段。
async fn read_image(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?;
        return Ok(ImageUpload::new(bytes.to_vec(), content_type));
    }
    Err(ApiError::bad_request("image file field is required"))
}
