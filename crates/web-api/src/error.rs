use application::{ApplicationError, ImageStoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(DomainError::InvalidArgument { field, reason }) => {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INVALID_ARGUMENT",
                    format!("{field}: {reason}"),
                )
            }
            // 会话域内的「不存在」按约定映射 400；404 只留给用户查询
            ApplicationError::Domain(DomainError::ChatNotFound) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "CHAT_NOT_FOUND",
                "chat not found",
            ),
            ApplicationError::Domain(DomainError::UserNotFound) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "USER_NOT_FOUND",
                "user not found",
            ),
            ApplicationError::Domain(DomainError::NotAMember) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "NOT_A_MEMBER",
                "user is not a chat member",
            ),
            ApplicationError::Domain(DomainError::PrivateChatImmutable) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "PRIVATE_CHAT_IMMUTABLE",
                "private chat membership cannot change",
            ),
            ApplicationError::Unauthorized => {
                ApiError::unauthorized("caller identity is not resolved")
            }
            ApplicationError::ImageStore(ImageStoreError::TooLarge) => {
                ApiError::bad_request("image too large")
            }
            ApplicationError::ImageStore(ImageStoreError::UnsupportedMediaType) => {
                ApiError::bad_request("unsupported image type")
            }
            ApplicationError::ImageStore(ImageStoreError::Upload(message)) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPLOAD_FAILED",
                message,
            ),
            ApplicationError::Sanitize(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SANITIZE_FAILED",
                err.to_string(),
            ),
            ApplicationError::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => {
                    ApiError::bad_request("requested resource not found")
                }
                RepositoryError::Conflict => ApiError::new(
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    "resource already exists",
                ),
                RepositoryError::Storage { message } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {message}"),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
