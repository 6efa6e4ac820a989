use application::{ImageStore, ImageStoreError, ImageUpload};
use async_trait::async_trait;
use serde::Deserialize;

/// Cloudinary 无签名上传配置。
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

pub struct CloudinaryImageStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryImageStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    async fn upload(
        &self,
        image: &ImageUpload,
        public_id: &str,
    ) -> Result<String, ImageStoreError> {
        let part = reqwest::multipart::Part::bytes(image.bytes.clone())
            .file_name(public_id.to_owned())
            .mime_str(&image.content_type)
            .map_err(|err| ImageStoreError::Upload(err.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .text("public_id", public_id.to_owned())
            .part("file", part);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|err| ImageStoreError::Upload(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageStoreError::Upload(format!(
                "cdn responded with {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| ImageStoreError::Upload(err.to_string()))?;
        Ok(body.secure_url)
    }
}
