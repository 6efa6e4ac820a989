use async_trait::async_trait;
use thiserror::Error;

const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5 MB
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

/// 客户端上传的原始图片。
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image too large")]
    TooLarge,
    #[error("unsupported image type")]
    UnsupportedMediaType,
    #[error("upload failed: {0}")]
    Upload(String),
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// 大小与 MIME 白名单校验，在触达外部存储之前执行。
    pub fn validate(&self) -> Result<(), ImageStoreError> {
        if self.bytes.len() > MAX_IMAGE_SIZE {
            return Err(ImageStoreError::TooLarge);
        }
        if !ALLOWED_MIME_TYPES.contains(&self.content_type.as_str()) {
            return Err(ImageStoreError::UnsupportedMediaType);
        }
        Ok(())
    }
}

/// 外部图片存储（CDN）端口。上传失败对头像更新是致命的。
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// 成功时返回持久化后的图片 URL。
    async fn upload(&self, image: &ImageUpload, public_id: &str)
        -> Result<String, ImageStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_oversized_image() {
        let upload = ImageUpload::new(vec![0u8; MAX_IMAGE_SIZE + 1], "image/png");
        assert!(matches!(upload.validate(), Err(ImageStoreError::TooLarge)));
    }

    #[test]
    fn validate_rejects_unknown_mime() {
        let upload = ImageUpload::new(vec![0u8; 16], "application/pdf");
        assert!(matches!(
            upload.validate(),
            Err(ImageStoreError::UnsupportedMediaType)
        ));
    }

    #[test]
    fn validate_accepts_svg_avatar() {
        let upload = ImageUpload::new(b"<svg/>".to_vec(), "image/svg+xml");
        assert!(upload.validate().is_ok());
    }
}
