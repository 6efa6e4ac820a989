use std::sync::Arc;

use domain::{DomainError, Nickname, RepositoryError, User};

use crate::{
    avatars::AvatarGenerator, clock::Clock, error::ApplicationError, image_store::ImageStore,
    image_store::ImageUpload, repository::UserRepository,
};

const SEARCH_LIMIT: i64 = 20;

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub image_store: Arc<dyn ImageStore>,
    pub avatar_generator: Arc<dyn AvatarGenerator>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    /// 幂等的取或建。重复创建返回已有记录，而不是报错。
    pub async fn ensure_user(&self, nickname: &str) -> Result<User, ApplicationError> {
        let nickname = Nickname::parse(nickname)?;
        ensure_user_record(
            self.deps.user_repository.as_ref(),
            self.deps.avatar_generator.as_ref(),
            self.deps.clock.as_ref(),
            nickname,
        )
        .await
    }

    pub async fn find_user(&self, nickname: &str) -> Result<Option<User>, ApplicationError> {
        // 非法昵称不可能存在，按查无此人处理
        let Ok(nickname) = Nickname::parse(nickname) else {
            return Ok(None);
        };
        Ok(self.deps.user_repository.find(&nickname).await?)
    }

    /// 上传失败是致命的，直接上抛。
    pub async fn update_avatar(
        &self,
        nickname: &str,
        image: ImageUpload,
    ) -> Result<User, ApplicationError> {
        let nickname = Nickname::parse(nickname)?;

        self.deps
            .user_repository
            .find(&nickname)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        image.validate()?;
        let public_id = format!("{nickname}_profile");
        let url = self.deps.image_store.upload(&image, &public_id).await?;

        let updated = self.deps.user_repository.set_avatar(&nickname, &url).await?;
        Ok(updated)
    }

    pub async fn search_users(
        &self,
        query: &str,
        caller: Option<&str>,
    ) -> Result<Vec<User>, ApplicationError> {
        resolve_identity(caller)?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .deps
            .user_repository
            .search(query, SEARCH_LIMIT)
            .await?)
    }
}

/// 解析请求附带的受信身份。缺失或无法解析一律 Unauthorized。
pub(crate) fn resolve_identity(caller: Option<&str>) -> Result<Nickname, ApplicationError> {
    let caller = caller.ok_or(ApplicationError::Unauthorized)?;
    Nickname::parse(caller).map_err(|_| ApplicationError::Unauthorized)
}

/// 取或建的共用实现：会话创建时也要确保成员在用户目录中存在。
///
/// 并发创建同一昵称时，落在后面的一侧会收到 Conflict，重查一次即可。
pub(crate) async fn ensure_user_record(
    repository: &dyn UserRepository,
    avatars: &dyn AvatarGenerator,
    clock: &dyn Clock,
    nickname: Nickname,
) -> Result<User, ApplicationError> {
    if let Some(existing) = repository.find(&nickname).await? {
        return Ok(existing);
    }

    let avatar = avatars.avatar_url(nickname.as_str());
    let user = User::register(nickname.clone(), avatar, clock.now());

    match repository.insert(user).await {
        Ok(stored) => Ok(stored),
        Err(RepositoryError::Conflict) => {
            let existing = repository
                .find(&nickname)
                .await?
                .ok_or(RepositoryError::Conflict)?;
            Ok(existing)
        }
        Err(err) => Err(err.into()),
    }
}
