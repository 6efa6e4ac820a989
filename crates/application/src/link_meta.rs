use async_trait::async_trait;
use domain::LinkMeta;

/// 链接预览提取端口。
///
/// 尽力而为：任何失败（无链接、抓取超时、页面不可解析）都退化为
/// `None`，不会影响消息发布。
#[async_trait]
pub trait MetaExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Option<LinkMeta>;
}
