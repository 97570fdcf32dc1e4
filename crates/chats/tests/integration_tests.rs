//! End-to-end behaviour of chat resolution and access rules against SQLite.

use messenger_chats::{
    ChatError, ChatService, ChatView, JoinOutcome, MessageService, PostMessageRequest,
    RenameChatRequest, ResolveChatRequest, User,
};
use messenger_config::DatabaseConfig;
use messenger_database::{initialize_database, CreateUserRequest, UserRepository};
use sqlx::SqlitePool;
use tempfile::TempDir;

struct TestContext {
    pool: SqlitePool,
    chats: ChatService,
    messages: MessageService,
    a: User,
    b: User,
    c: User,
    _temp_dir: TempDir,
}

impl TestContext {
    /// A(+1), B(+2), C(+3) registered, no chats.
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let config = DatabaseConfig {
            url: format!("sqlite:{}", temp_dir.path().join("chats.db").display()),
            max_connections: 8,
        };
        let pool = initialize_database(&config).await.expect("database");

        let users = UserRepository::new(pool.clone());
        let mut created = Vec::new();
        for (phone, name) in [("+1", "Ann"), ("+2", "Bob"), ("+3", "")] {
            created.push(
                users
                    .create(&CreateUserRequest {
                        phone_number: phone.to_string(),
                        first_name: name.to_string(),
                        last_name: String::new(),
                        password_hash: "unused".to_string(),
                    })
                    .await
                    .expect("user"),
            );
        }
        let c = created.pop().expect("c");
        let b = created.pop().expect("b");
        let a = created.pop().expect("a");

        Self {
            chats: ChatService::new(pool.clone()),
            messages: MessageService::new(pool.clone()),
            pool,
            a,
            b,
            c,
            _temp_dir: temp_dir,
        }
    }

    async fn add_user(&self, phone: &str) -> User {
        UserRepository::new(self.pool.clone())
            .create(&CreateUserRequest {
                phone_number: phone.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "unused".to_string(),
            })
            .await
            .expect("user")
    }

    async fn chat_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM chats")
            .fetch_one(&self.pool)
            .await
            .expect("count")
    }
}

fn resolve(participants: &[&str], name: Option<&str>) -> ResolveChatRequest {
    ResolveChatRequest {
        participants: participants.iter().map(|p| p.to_string()).collect(),
        name: name.map(str::to_string),
        is_group: None,
    }
}

fn post(chat_id: i64, content: &str) -> PostMessageRequest {
    PostMessageRequest {
        chat_id,
        content: content.to_string(),
    }
}

#[tokio::test]
async fn scenario_direct_reuse_group_join_and_like_toggle() {
    let ctx = TestContext::new().await;

    let first = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    assert!(first.created);
    assert!(!first.chat.is_group);
    assert_eq!(first.chat.participants.len(), 2);

    let again = ctx.chats.resolve_chat(&ctx.b, &resolve(&["+1"], None)).await.unwrap();
    assert!(!again.created);
    assert_eq!(again.chat.id, first.chat.id);

    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();
    assert!(trio.created);
    assert!(trio.chat.is_group);
    assert_ne!(trio.chat.id, first.chat.id);

    let joined = ctx.chats.join_chat(ctx.c.id, trio.chat.id).await.unwrap();
    assert!(matches!(joined, JoinOutcome::AlreadyMember(_)));
    assert_eq!(joined.chat().participants.len(), 3);

    let message = ctx.messages.post_message(ctx.b.id, &post(first.chat.id, "hello")).await.unwrap();
    assert!(ctx.messages.toggle_like(ctx.a.id, message.id).await.unwrap());
    assert!(!ctx.messages.toggle_like(ctx.a.id, message.id).await.unwrap());

    assert_eq!(ctx.chat_count().await, 2);
}

#[tokio::test]
async fn direct_resolution_is_idempotent_for_either_requester() {
    let ctx = TestContext::new().await;

    let mut ids = Vec::new();
    for (requester, target) in [(&ctx.a, "+2"), (&ctx.b, "+1"), (&ctx.a, "+2")] {
        let resolved = ctx.chats.resolve_chat(requester, &resolve(&[target], None)).await.unwrap();
        ids.push(resolved.chat.id);
    }

    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(ctx.chat_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_direct_resolution_yields_one_chat() {
    let ctx = TestContext::new().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = ctx.chats.clone();
        let (requester, target) = if i % 2 == 0 {
            (ctx.a.clone(), "+2")
        } else {
            (ctx.b.clone(), "+1")
        };
        handles.push(tokio::spawn(async move {
            service.resolve_chat(&requester, &resolve(&[target], None)).await
        }));
    }

    let mut ids = Vec::new();
    let mut created = 0;
    for handle in handles {
        let resolved = handle.await.expect("task").expect("resolve");
        if resolved.created {
            created += 1;
        }
        ids.push(resolved.chat.id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "every request must see the same chat");
    assert_eq!(created, 1);
    assert_eq!(ctx.chat_count().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_like_toggles_by_one_user_cancel_out() {
    let ctx = TestContext::new().await;
    let direct = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let message = ctx.messages.post_message(ctx.b.id, &post(direct.chat.id, "hi")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let service = ctx.messages.clone();
        let (user_id, message_id) = (ctx.a.id, message.id);
        handles.push(tokio::spawn(async move { service.toggle_like(user_id, message_id).await }));
    }

    let mut liked = 0;
    for handle in handles {
        if handle.await.expect("task").expect("toggle") {
            liked += 1;
        }
    }
    assert_eq!(liked, 5, "likes and unlikes must alternate");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_likes WHERE message_id = ?")
        .bind(message.id)
        .fetch_one(&ctx.pool)
        .await
        .expect("count");
    assert_eq!(rows, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_group_creation_keeps_names_unique() {
    let ctx = TestContext::new().await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let service = ctx.chats.clone();
        let requester = [&ctx.a, &ctx.b, &ctx.c][i % 3].clone();
        let others: Vec<&str> = ["+1", "+2", "+3"]
            .into_iter()
            .filter(|phone| *phone != requester.phone_number)
            .collect();
        let request = resolve(&others, Some("Same"));
        handles.push(tokio::spawn(async move { service.resolve_chat(&requester, &request).await }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(resolved) => {
                assert!(resolved.created);
                created += 1;
            }
            Err(ChatError::DuplicateGroupName { name }) => assert_eq!(name, "Same"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(ctx.chat_count().await, 1);
}

#[tokio::test]
async fn classification_follows_participant_count_not_the_flag() {
    let ctx = TestContext::new().await;

    let mut flagged = resolve(&["+2"], Some("Pretend group"));
    flagged.is_group = Some(true);
    let direct = ctx.chats.resolve_chat(&ctx.a, &flagged).await.unwrap();
    assert!(!direct.chat.is_group);
    assert!(direct.chat.name.is_empty());

    let mut unflagged = resolve(&["+2", "+3"], Some("Real group"));
    unflagged.is_group = Some(false);
    let group = ctx.chats.resolve_chat(&ctx.a, &unflagged).await.unwrap();
    assert!(group.chat.is_group);
    assert_eq!(group.chat.name, "Real group");
}

#[tokio::test]
async fn superset_never_unifies_with_direct_chat() {
    let ctx = TestContext::new().await;

    let pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();
    assert_ne!(pair.chat.id, trio.chat.id);

    let other_pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+3"], None)).await.unwrap();
    assert!(other_pair.created);
    assert_ne!(other_pair.chat.id, pair.chat.id);
}

#[tokio::test]
async fn group_without_name_is_rejected() {
    let ctx = TestContext::new().await;

    for name in [None, Some("   ")] {
        let err = ctx
            .chats
            .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], name))
            .await
            .expect_err("groups need names");
        assert!(matches!(err, ChatError::MissingGroupName));
    }
    assert_eq!(ctx.chat_count().await, 0);
}

#[tokio::test]
async fn duplicate_group_name_is_rejected() {
    let ctx = TestContext::new().await;
    let d = ctx.add_user("+4").await;

    ctx.chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();

    let err = ctx
        .chats
        .resolve_chat(&d, &resolve(&["+2", "+3"], Some(" Trio ")))
        .await
        .expect_err("name is taken");
    assert!(matches!(err, ChatError::DuplicateGroupName { ref name } if name == "Trio"));
}

#[tokio::test]
async fn unknown_and_empty_participants_are_reported() {
    let ctx = TestContext::new().await;

    let err = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+404", "+405", "+404"], None))
        .await
        .expect_err("unknown phone numbers");
    match err {
        ChatError::UnknownParticipant { identifiers } => {
            assert_eq!(identifiers, vec!["+404".to_string(), "+405".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }

    for participants in [&[][..], &["+1"][..], &["  "][..]] {
        let err = ctx
            .chats
            .resolve_chat(&ctx.a, &resolve(participants, None))
            .await
            .expect_err("requester alone is not a chat");
        assert!(matches!(err, ChatError::EmptyParticipantSet));
    }
    assert_eq!(ctx.chat_count().await, 0);
}

#[tokio::test]
async fn view_boundaries_for_participants_and_outsiders() {
    let ctx = TestContext::new().await;
    let outsider = ctx.add_user("+9").await;

    let pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();
    ctx.messages.post_message(ctx.a.id, &post(trio.chat.id, "secret")).await.unwrap();

    match ctx.chats.view_chat(ctx.a.id, pair.chat.id).await.unwrap() {
        ChatView::FullDetail(detail) => {
            assert_eq!(detail.title, "+2");
            assert!(!detail.is_group);
        }
        other => panic!("expected full detail, got {other:?}"),
    }

    assert!(matches!(
        ctx.chats.view_chat(outsider.id, pair.chat.id).await.unwrap(),
        ChatView::Forbidden
    ));

    match ctx.chats.view_chat(outsider.id, trio.chat.id).await.unwrap() {
        ChatView::RedactedGroupPreview(preview) => {
            assert_eq!(preview.name, "Trio");
            assert_eq!(preview.participants.len(), 3);
        }
        other => panic!("expected preview, got {other:?}"),
    }

    match ctx.chats.view_chat(ctx.c.id, trio.chat.id).await.unwrap() {
        ChatView::FullDetail(detail) => {
            assert_eq!(detail.messages.len(), 1);
            assert_eq!(detail.messages[0].content, "secret");
        }
        other => panic!("expected full detail, got {other:?}"),
    }

    let err = ctx.chats.view_chat(ctx.a.id, 9_999).await.expect_err("missing chat");
    assert!(matches!(err, ChatError::ChatNotFound { id: 9_999 }));
}

#[tokio::test]
async fn full_detail_lists_messages_in_order_with_like_annotations() {
    let ctx = TestContext::new().await;
    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();

    let first = ctx.messages.post_message(ctx.a.id, &post(trio.chat.id, "one")).await.unwrap();
    ctx.messages.post_message(ctx.b.id, &post(trio.chat.id, "two")).await.unwrap();
    ctx.messages.toggle_like(ctx.b.id, first.id).await.unwrap();
    ctx.messages.toggle_like(ctx.c.id, first.id).await.unwrap();

    let ChatView::FullDetail(detail) = ctx.chats.view_chat(ctx.b.id, trio.chat.id).await.unwrap() else {
        panic!("participant must get full detail");
    };

    let contents: Vec<&str> = detail.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two"]);
    assert!(detail.messages[0].liked);
    assert!(!detail.messages[1].liked);
    assert_eq!(detail.messages[0].liked_by, vec!["Bob".to_string(), "+3".to_string()]);
    assert_eq!(detail.messages[0].author.phone_number, "+1");
}

#[tokio::test]
async fn rename_boundaries() {
    let ctx = TestContext::new().await;
    let outsider = ctx.add_user("+9").await;

    let pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();
    let rename = RenameChatRequest { name: "Quartet".into() };

    let err = ctx.chats.rename_chat(ctx.a.id, pair.chat.id, &rename).await.expect_err("direct");
    assert!(matches!(err, ChatError::InvalidOperation { .. }));

    let err = ctx.chats.rename_chat(outsider.id, trio.chat.id, &rename).await.expect_err("outsider");
    assert!(matches!(err, ChatError::Forbidden { .. }));

    let renamed = ctx.chats.rename_chat(ctx.b.id, trio.chat.id, &rename).await.unwrap();
    assert_eq!(renamed.name, "Quartet");
    assert!(renamed.updated_at >= trio.chat.updated_at);

    match ctx.chats.view_chat(ctx.c.id, trio.chat.id).await.unwrap() {
        ChatView::FullDetail(detail) => assert_eq!(detail.title, "Quartet"),
        other => panic!("expected full detail, got {other:?}"),
    }

    let blank = RenameChatRequest { name: "  ".into() };
    let err = ctx.chats.rename_chat(ctx.b.id, trio.chat.id, &blank).await.expect_err("blank");
    assert!(matches!(err, ChatError::Validation { .. }));
}

#[tokio::test]
async fn rename_to_another_groups_name_is_rejected() {
    let ctx = TestContext::new().await;
    let d = ctx.add_user("+4").await;

    ctx.chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Taken")))
        .await
        .unwrap();
    let other = ctx
        .chats
        .resolve_chat(&d, &resolve(&["+2", "+3"], Some("Mine")))
        .await
        .unwrap();

    let err = ctx
        .chats
        .rename_chat(d.id, other.chat.id, &RenameChatRequest { name: "Taken".into() })
        .await
        .expect_err("name collision");
    assert!(matches!(err, ChatError::DuplicateGroupName { .. }));
}

#[tokio::test]
async fn join_adds_outsider_to_group_but_never_to_direct_chat() {
    let ctx = TestContext::new().await;
    let d = ctx.add_user("+4").await;

    let pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();

    let err = ctx.chats.join_chat(d.id, pair.chat.id).await.expect_err("direct");
    assert!(matches!(err, ChatError::InvalidOperation { .. }));

    let joined = ctx.chats.join_chat(d.id, trio.chat.id).await.unwrap();
    assert!(matches!(joined, JoinOutcome::Joined(_)));
    assert!(joined.chat().has_participant(d.id));
    assert!(joined.chat().updated_at >= trio.chat.updated_at);

    let again = ctx.chats.join_chat(d.id, trio.chat.id).await.unwrap();
    assert!(matches!(again, JoinOutcome::AlreadyMember(_)));
    assert_eq!(again.chat().participants.len(), 4);

    assert!(matches!(
        ctx.chats.view_chat(d.id, trio.chat.id).await.unwrap(),
        ChatView::FullDetail(_)
    ));
}

#[tokio::test]
async fn messaging_and_liking_require_participation() {
    let ctx = TestContext::new().await;
    let outsider = ctx.add_user("+9").await;

    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Trio")))
        .await
        .unwrap();
    let message = ctx.messages.post_message(ctx.a.id, &post(trio.chat.id, "hi")).await.unwrap();

    let err = ctx
        .messages
        .post_message(outsider.id, &post(trio.chat.id, "let me in"))
        .await
        .expect_err("outsider cannot post");
    assert!(matches!(err, ChatError::Forbidden { .. }));

    let err = ctx.messages.toggle_like(outsider.id, message.id).await.expect_err("outsider cannot like");
    assert!(matches!(err, ChatError::Forbidden { .. }));

    let err = ctx
        .messages
        .post_message(ctx.a.id, &post(trio.chat.id, "   "))
        .await
        .expect_err("blank content");
    assert!(matches!(err, ChatError::Validation { .. }));

    let err = ctx.messages.post_message(ctx.a.id, &post(777, "hi")).await.expect_err("no chat");
    assert!(matches!(err, ChatError::ChatNotFound { id: 777 }));

    let err = ctx.messages.toggle_like(ctx.a.id, 888).await.expect_err("no message");
    assert!(matches!(err, ChatError::MessageNotFound { id: 888 }));
}

#[tokio::test]
async fn like_toggle_twice_restores_likers() {
    let ctx = TestContext::new().await;
    let pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let message = ctx.messages.post_message(ctx.a.id, &post(pair.chat.id, "hi")).await.unwrap();
    ctx.messages.toggle_like(ctx.b.id, message.id).await.unwrap();

    let likers = |view: ChatView| match view {
        ChatView::FullDetail(detail) => detail.messages[0].liked_by.clone(),
        other => panic!("expected full detail, got {other:?}"),
    };

    let before = likers(ctx.chats.view_chat(ctx.a.id, pair.chat.id).await.unwrap());
    assert!(ctx.messages.toggle_like(ctx.a.id, message.id).await.unwrap());
    assert!(!ctx.messages.toggle_like(ctx.a.id, message.id).await.unwrap());
    let after = likers(ctx.chats.view_chat(ctx.a.id, pair.chat.id).await.unwrap());

    assert_eq!(before, after);
    assert_eq!(after, vec!["Bob".to_string()]);
}

#[tokio::test]
async fn listing_and_search_are_scoped_to_the_requester() {
    let ctx = TestContext::new().await;
    let outsider = ctx.add_user("+9").await;

    let pair = ctx.chats.resolve_chat(&ctx.a, &resolve(&["+2"], None)).await.unwrap();
    let trio = ctx
        .chats
        .resolve_chat(&ctx.a, &resolve(&["+2", "+3"], Some("Book Club")))
        .await
        .unwrap();
    ctx.messages.post_message(ctx.b.id, &post(pair.chat.id, "latest")).await.unwrap();

    let listed = ctx.chats.list_chats(ctx.b.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].chat_id, trio.chat.id);
    assert_eq!(listed[1].title, "+1");
    assert_eq!(listed[1].last_message.as_deref(), Some("latest"));

    let found = ctx.chats.search_chats(ctx.c.id, "book").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Book Club");

    assert!(ctx.chats.search_chats(outsider.id, "book").await.unwrap().is_empty());
    assert!(ctx.chats.list_chats(outsider.id).await.unwrap().is_empty());
}
