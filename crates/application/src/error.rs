use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::image_store::ImageStoreError;
use crate::sanitizer::SanitizeError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("image store error: {0}")]
    ImageStore(#[from] ImageStoreError),
    #[error("sanitize error: {0}")]
    Sanitize(#[from] SanitizeError),
    /// 调用者身份缺失或无法解析。
    #[error("caller identity is not resolved")]
    Unauthorized,
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
