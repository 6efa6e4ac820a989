use std::collections::{HashMap, HashSet};

use application::{MessageSanitizer, SanitizeError};

/// 消息正文白名单：段落、加粗、斜体、仅带 href 的链接、行内代码。
/// 其余标签剥壳留文，脚本连内容一起丢弃。
const ALLOWED_TAGS: &[&str] = &["p", "strong", "em", "a", "code"];

pub struct AmmoniaSanitizer;

impl MessageSanitizer for AmmoniaSanitizer {
    fn sanitize(&self, raw: &str) -> Result<String, SanitizeError> {
        let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
        let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
        tag_attributes.insert("a", ["href"].into_iter().collect());

        let clean = ammonia::Builder::default()
            .tags(tags)
            .tag_attributes(tag_attributes)
            .generic_attributes(HashSet::new())
            .link_rel(None)
            .clean(raw)
            .to_string();
        Ok(clean)
    }
}
