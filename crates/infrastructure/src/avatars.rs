use application::AvatarGenerator;

/// 基于种子的确定性生成头像：同一个昵称永远得到同一张图。
pub struct IdenticonAvatars {
    base_url: String,
}

impl IdenticonAvatars {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

impl AvatarGenerator for IdenticonAvatars {
    fn avatar_url(&self, seed: &str) -> String {
        // 种子来自已验证的昵称或 uuid，无需再做 URL 编码
        format!("{}/{}.svg", self.base_url, seed)
    }
}
