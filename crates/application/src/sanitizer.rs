use thiserror::Error;

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("sanitize failed: {0}")]
    Failed(String),
}

/// 消息正文白名单清洗端口。写入时执行一次，读取原样返回。
///
/// 清洗失败对消息发布是致命的（与链接预览的尽力而为不同）。
pub trait MessageSanitizer: Send + Sync {
    fn sanitize(&self, raw: &str) -> Result<String, SanitizeError>;
}
