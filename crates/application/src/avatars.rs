/// 生成头像端口。
///
/// 同一个种子必须得到同一个 URL：`ensure_user` 的幂等性依赖这一点。
pub trait AvatarGenerator: Send + Sync {
    fn avatar_url(&self, seed: &str) -> String;
}
