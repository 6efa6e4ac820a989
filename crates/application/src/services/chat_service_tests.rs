use std::sync::Arc;

use domain::{ChatEvent, ChatKind, DomainError};

use crate::error::ApplicationError;
use crate::services::test_support::*;
use crate::services::{ChatService, ChatServiceDependencies, CreateChatRequest};
use crate::{ChatRepository, UserRepository};

struct Fixture {
    service: ChatService,
    chats: Arc<InMemoryChatRepository>,
    users: Arc<InMemoryUserRepository>,
    broadcaster: Arc<RecordingBroadcaster>,
}

fn fixture() -> Fixture {
    let chats = Arc::new(InMemoryChatRepository::default());
    let users = Arc::new(InMemoryUserRepository::default());
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    let service = ChatService::new(ChatServiceDependencies {
        chat_repository: chats.clone(),
        user_repository: users.clone(),
        image_store: Arc::new(StaticImageStore),
        avatar_generator: Arc::new(SeedAvatars),
        broadcaster: broadcaster.clone(),
        clock: Arc::new(FixedClock(fixed_now())),
    });
    Fixture {
        service,
        chats,
        users,
        broadcaster,
    }
}

fn request(kind: &str, title: &str, members: Option<Vec<&str>>) -> CreateChatRequest {
    CreateChatRequest {
        kind: kind.to_owned(),
        title: title.to_owned(),
        members: members.map(|m| m.into_iter().map(str::to_owned).collect()),
    }
}

fn assert_invalid_argument(result: Result<impl std::fmt::Debug, ApplicationError>) {
    match result {
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. })) => {}
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

#[tokio::test]
async fn create_chat_rejects_missing_or_empty_members() {
    let f = fixture();

    assert_invalid_argument(f.service.create_chat(request("group", "t", None)).await);
    assert_invalid_argument(
        f.service
            .create_chat(request("group", "t", Some(vec![])))
            .await,
    );
}

#[tokio::test]
async fn create_chat_rejects_private_without_exactly_two_members() {
    let f = fixture();

    for members in [vec!["a"], vec!["a", "b", "c"]] {
        assert_invalid_argument(
            f.service
                .create_chat(request("private", "t", Some(members)))
                .await,
        );
    }
}

#[tokio::test]
async fn create_chat_rejects_unknown_kind() {
    let f = fixture();

    assert_invalid_argument(
        f.service
            .create_chat(request("fake", "t", Some(vec!["a", "b"])))
            .await,
    );
}

#[tokio::test]
async fn created_private_chat_has_two_members_and_no_avatar() {
    let f = fixture();

    let chat = f
        .service
        .create_chat(request("private", "t", Some(vec!["a", "b"])))
        .await
        .unwrap();

    assert_eq!(chat.kind, ChatKind::Private);
    assert_eq!(chat.members.len(), 2);
    assert_eq!(chat.avatar, None);
    assert!(chat.messages.is_empty());
    assert_eq!(chat.created_at, fixed_now());
}

#[tokio::test]
async fn created_group_chat_carries_generated_avatar() {
    let f = fixture();

    let chat = f
        .service
        .create_chat(request("group", "g", Some(vec!["a", "b", "c"])))
        .await
        .unwrap();

    assert_eq!(chat.kind, ChatKind::Group);
    let avatar = chat.avatar.expect("group chat must have an avatar");
    assert!(avatar.starts_with("https://avatars.test/"));
}

#[tokio::test]
async fn create_chat_registers_referenced_members() {
    let f = fixture();

    f.service
        .create_chat(request("private", "t", Some(vec!["a", "b"])))
        .await
        .unwrap();

    for nickname in ["a", "b"] {
        let nick = domain::Nickname::parse(nickname).unwrap();
        assert!(f.users.find(&nick).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn create_chat_publishes_chat_created_event() {
    let f = fixture();

    let chat = f
        .service
        .create_chat(request("private", "t", Some(vec!["a", "b"])))
        .await
        .unwrap();

    let events = f.broadcaster.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ChatEvent::Chat { chat: published } => assert_eq!(published.id, chat.id),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn list_chats_filters_by_membership() {
    let f = fixture();
    f.service
        .create_chat(request("private", "ab", Some(vec!["a", "b"])))
        .await
        .unwrap();
    f.service
        .create_chat(request("private", "bc", Some(vec!["b", "c"])))
        .await
        .unwrap();

    let for_a = f.service.list_chats(Some("a")).await.unwrap();
    let for_b = f.service.list_chats(Some("b")).await.unwrap();
    let for_d = f.service.list_chats(Some("d")).await.unwrap();

    assert_eq!(for_a.len(), 1);
    assert_eq!(for_a[0].title, "ab");
    assert_eq!(for_b.len(), 2);
    assert!(for_d.is_empty());
}

#[tokio::test]
async fn list_chats_requires_resolved_identity() {
    let f = fixture();

    assert!(matches!(
        f.service.list_chats(None).await,
        Err(ApplicationError::Unauthorized)
    ));
}

#[tokio::test]
async fn update_title_fails_for_missing_chat() {
    let f = fixture();

    let result = f
        .service
        .update_title(&uuid::Uuid::new_v4().to_string(), "new")
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::ChatNotFound))
    ));
}

#[tokio::test]
async fn update_title_renames_and_persists() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("group", "old", Some(vec!["a"])))
        .await
        .unwrap();

    let updated = f
        .service
        .update_title(&chat.id.to_string(), "new")
        .await
        .unwrap();

    assert_eq!(updated.title, "new");
    let reloaded = f.chats.find_by_id(chat.id).await.unwrap().unwrap();
    assert_eq!(reloaded.title, "new");
}

#[tokio::test]
async fn update_avatar_rejects_private_chat_before_upload() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("private", "t", Some(vec!["a", "b"])))
        .await
        .unwrap();

    assert_invalid_argument(
        f.service
            .update_avatar(&chat.id.to_string(), png_upload())
            .await,
    );
}

#[tokio::test]
async fn update_avatar_persists_uploaded_url() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("group", "g", Some(vec!["a"])))
        .await
        .unwrap();

    let updated = f
        .service
        .update_avatar(&chat.id.to_string(), png_upload())
        .await
        .unwrap();

    let expected = format!("https://cdn.test/image/upload/chat_{}", chat.id);
    assert_eq!(updated.avatar.as_deref(), Some(expected.as_str()));
    let reloaded = f.chats.find_by_id(chat.id).await.unwrap().unwrap();
    assert_eq!(reloaded.avatar.as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn add_member_fails_for_missing_chat_or_unknown_user() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("group", "g", Some(vec!["a"])))
        .await
        .unwrap();

    let missing_chat = f
        .service
        .add_member(&uuid::Uuid::new_v4().to_string(), "a")
        .await;
    assert!(matches!(
        missing_chat,
        Err(ApplicationError::Domain(DomainError::ChatNotFound))
    ));

    let unknown_user = f.service.add_member(&chat.id.to_string(), "ghost").await;
    assert!(matches!(
        unknown_user,
        Err(ApplicationError::Domain(DomainError::UserNotFound))
    ));
}

#[tokio::test]
async fn private_chat_membership_is_frozen() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("private", "t", Some(vec!["a", "b"])))
        .await
        .unwrap();
    // 被加的人是已知用户，被拒仅仅因为会话是私聊
    f.service
        .create_chat(request("group", "g", Some(vec!["c"])))
        .await
        .unwrap();

    let add = f.service.add_member(&chat.id.to_string(), "c").await;
    let remove = f.service.remove_member(&chat.id.to_string(), "a").await;

    assert!(matches!(
        add,
        Err(ApplicationError::Domain(DomainError::PrivateChatImmutable))
    ));
    assert!(matches!(
        remove,
        Err(ApplicationError::Domain(DomainError::PrivateChatImmutable))
    ));
}

#[tokio::test]
async fn group_member_mutations_are_idempotent() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("group", "g", Some(vec!["a", "b"])))
        .await
        .unwrap();

    let after_add = f.service.add_member(&chat.id.to_string(), "b").await.unwrap();
    assert_eq!(after_add.members.len(), 2);

    f.service.remove_member(&chat.id.to_string(), "b").await.unwrap();
    let after_second_remove = f
        .service
        .remove_member(&chat.id.to_string(), "b")
        .await
        .unwrap();
    assert_eq!(after_second_remove.members.len(), 1);
}

#[tokio::test]
async fn removed_member_no_longer_sees_the_chat() {
    let f = fixture();
    let chat = f
        .service
        .create_chat(request("group", "g", Some(vec!["a", "b", "c"])))
        .await
        .unwrap();

    f.service.remove_member(&chat.id.to_string(), "a").await.unwrap();

    let for_a = f.service.list_chats(Some("a")).await.unwrap();
    assert!(for_a.iter().all(|c| c.id != chat.id));
}
