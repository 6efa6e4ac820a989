use std::sync::OnceLock;
use std::time::Duration;

use application::MetaExtractor;
use async_trait::async_trait;
use domain::LinkMeta;
use regex::Regex;

const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// 抓取正文里第一个链接的 OpenGraph / title 元数据。
///
/// 整条路径都是尽力而为：没有链接、抓取失败、页面不可解析，
/// 统统退化为 `None`，绝不影响消息发布。
pub struct HttpMetaExtractor {
    client: reqwest::Client,
}

impl HttpMetaExtractor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpMetaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetaExtractor for HttpMetaExtractor {
    async fn extract(&self, text: &str) -> Option<LinkMeta> {
        let url = find_first_url(text)?;

        let response = match self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(url, status = %response.status(), "link preview fetch failed");
                return None;
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "link preview fetch failed");
                return None;
            }
        };

        let html = response.text().await.ok()?;
        Some(parse_page_meta(url, &html))
    }
}

pub(crate) fn find_first_url(text: &str) -> Option<&str> {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    let re = URL_RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s<>"']+"#).expect("url pattern is valid")
    });
    re.find(text).map(|m| m.as_str())
}

pub(crate) fn parse_page_meta(url: &str, html: &str) -> LinkMeta {
    LinkMeta {
        url: url.to_owned(),
        title: meta_content(html, "og:title").or_else(|| page_title(html)),
        description: meta_content(html, "og:description"),
        image: meta_content(html, "og:image"),
    }
}

/// `<meta property=... content=...>` 两种属性顺序都要认。
fn meta_content(html: &str, property: &str) -> Option<String> {
    let patterns = [
        format!(
            r#"(?is)<meta[^>]+(?:property|name)\s*=\s*["']{property}["'][^>]+content\s*=\s*["']([^"']*)["']"#
        ),
        format!(
            r#"(?is)<meta[^>]+content\s*=\s*["']([^"']*)["'][^>]+(?:property|name)\s*=\s*["']{property}["']"#
        ),
    ];
    for pattern in patterns {
        let re = Regex::new(&pattern).ok()?;
        if let Some(found) = re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_owned())
            .filter(|v| !v.is_empty())
        {
            return Some(found);
        }
    }
    None
}

fn page_title(html: &str) -> Option<String> {
    static TITLE_RE: OnceLock<Regex> = OnceLock::new();
    let re = TITLE_RE.get_or_init(|| {
        Regex::new(r"(?is)<title[^>]*>([^<]*)</title>").expect("title pattern is valid")
    });
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|v| !v.is_empty())
}
