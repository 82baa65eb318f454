use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use emora_core::{
    AssistantGateway, Emora, EmoraError, GatewayError, HistoryEntry, Session, SessionState,
};
use emora_db::Database;
use emora_types::api::RegisterRequest;
use emora_types::{Category, Role};

/// Replies with a fixed result and records every request it sees.
struct StubGateway {
    reply: Result<String, GatewayError>,
    calls: Mutex<Vec<(Vec<HistoryEntry>, String)>>,
}

impl StubGateway {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: GatewayError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Vec<HistoryEntry>, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AssistantGateway for StubGateway {
    async fn reply(
        &self,
        history: &[HistoryEntry],
        instruction: &str,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((history.to_vec(), instruction.to_string()));
        self.reply.clone()
    }
}

fn app(gateway: Arc<StubGateway>) -> (Arc<Database>, Emora) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    (db.clone(), Emora::new(db, gateway))
}

fn signup(username: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        name: username.to_string(),
        age: 20,
        dob: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
        guardian_email: None,
        guardian_phone: None,
        username: username.to_string(),
        password: password.to_string(),
    }
}

async fn logged_in(emora: &Emora, username: &str) -> Session {
    emora.register(signup(username, "secret1")).await.unwrap();
    let mut session = Session::new();
    emora.login(&mut session, username, "secret1").await.unwrap();
    session
}

#[tokio::test]
async fn alice_asks_about_gravity() {
    let gateway = StubGateway::replying("Gravity is a force.");
    let (_, emora) = app(gateway.clone());

    let alice_id = emora.register(signup("alice", "secret1")).await.unwrap();

    let mut session = Session::new();
    let identity = emora.login(&mut session, "alice", "secret1").await.unwrap();
    assert_eq!(identity.id, alice_id);

    let mut other = Session::new();
    assert!(matches!(
        emora.login(&mut other, "alice", "wrong").await,
        Err(EmoraError::InvalidCredential)
    ));
    assert_eq!(other.state(), &SessionState::Anonymous);

    let chat = emora
        .create_chat(&mut session, Some("My first chat"), "education")
        .await
        .unwrap();
    assert_eq!(chat.category, Category::Education);

    let chats = emora.list_chats(&mut session).await.unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].title, "My first chat");

    emora
        .send_message(&mut session, chat.id, "What is gravity?")
        .await
        .unwrap();

    let history = emora.chat_history(&mut session, chat.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "What is gravity?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Gravity is a force.");
}

#[tokio::test]
async fn gateway_sees_full_history_and_category_persona() {
    let gateway = StubGateway::replying("noted");
    let (_, emora) = app(gateway.clone());
    let mut session = logged_in(&emora, "alice").await;

    let chat = emora.create_chat(&mut session, None, "emotional").await.unwrap();
    emora.send_message(&mut session, chat.id, "first").await.unwrap();
    emora.send_message(&mut session, chat.id, "second").await.unwrap();

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);

    let (history, instruction) = &calls[1];
    assert_eq!(instruction, "You are Emora, an emotional support guide.");
    assert_eq!(
        history,
        &vec![
            HistoryEntry::user("first"),
            HistoryEntry::assistant("noted"),
            HistoryEntry::user("second"),
        ]
    );

    assert_eq!(emora.chat_history(&mut session, chat.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn failed_gateway_call_writes_nothing() {
    let gateway = StubGateway::failing(GatewayError::MissingCredential);
    let (_, emora) = app(gateway.clone());
    let mut session = logged_in(&emora, "alice").await;
    let chat = emora.create_chat(&mut session, None, "personal").await.unwrap();

    let err = emora
        .send_message(&mut session, chat.id, "anyone there?")
        .await
        .unwrap_err();
    assert!(matches!(err, EmoraError::Gateway(GatewayError::MissingCredential)));
    assert!(err.is_retryable());

    assert!(emora.chat_history(&mut session, chat.id).await.unwrap().is_empty());
    // The session survives the failure.
    assert_eq!(session.selected_chat().map(|c| c.id), Some(chat.id));
}

#[tokio::test]
async fn blank_message_is_rejected_before_the_gateway() {
    let gateway = StubGateway::replying("unused");
    let (_, emora) = app(gateway.clone());
    let mut session = logged_in(&emora, "alice").await;
    let chat = emora.create_chat(&mut session, None, "ethical").await.unwrap();

    let err = emora.send_message(&mut session, chat.id, "   ").await.unwrap_err();
    assert!(matches!(err, EmoraError::Validation(_)));
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn users_only_see_their_own_chats() {
    let gateway = StubGateway::replying("ok");
    let (_, emora) = app(gateway.clone());
    let mut alice = logged_in(&emora, "alice").await;
    let mut bob = logged_in(&emora, "bob").await;

    let chat = emora.create_chat(&mut alice, Some("private"), "personal").await.unwrap();
    emora.send_message(&mut alice, chat.id, "diary entry").await.unwrap();

    assert!(emora.list_chats(&mut bob).await.unwrap().is_empty());
    assert!(matches!(
        emora.chat_history(&mut bob, chat.id).await,
        Err(EmoraError::NotFound(_))
    ));
    assert!(matches!(
        emora.send_message(&mut bob, chat.id, "hello?").await,
        Err(EmoraError::NotFound(_))
    ));
    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(emora.chat_history(&mut alice, chat.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn anonymous_and_logged_out_sessions_are_refused() {
    let (_, emora) = app(StubGateway::replying("ok"));
    let mut session = Session::new();
    assert!(matches!(
        emora.list_chats(&mut session).await,
        Err(EmoraError::Unauthenticated)
    ));

    let mut session = logged_in(&emora, "alice").await;
    let chat = emora.create_chat(&mut session, None, "education").await.unwrap();
    emora.logout(&mut session);

    assert_eq!(session.state(), &SessionState::Anonymous);
    assert!(matches!(
        emora.chat_history(&mut session, chat.id).await,
        Err(EmoraError::Unauthenticated)
    ));
}

#[tokio::test]
async fn expired_sessions_are_cleared() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let emora = Emora::new(db, StubGateway::replying("ok")).with_session_ttl(Duration::zero());

    let mut session = logged_in(&emora, "alice").await;
    assert!(matches!(
        emora.list_chats(&mut session).await,
        Err(EmoraError::Unauthenticated)
    ));
    assert_eq!(session.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn unrepresentable_session_lifetime_fails_login() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let emora = Emora::new(db, StubGateway::replying("ok")).with_session_ttl(Duration::MAX);
    emora.register(signup("alice", "secret1")).await.unwrap();

    let mut session = Session::new();
    let err = emora.login(&mut session, "alice", "secret1").await.unwrap_err();
    assert!(matches!(err, EmoraError::Storage(_)));
    assert_eq!(session.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn invalid_category_creates_no_chat_and_keeps_session() {
    let (_, emora) = app(StubGateway::replying("ok"));
    let mut session = logged_in(&emora, "alice").await;

    let err = emora.create_chat(&mut session, Some("x"), "finance").await.unwrap_err();
    assert!(matches!(err, EmoraError::Validation(_)));
    assert!(emora.list_chats(&mut session).await.unwrap().is_empty());
    assert!(matches!(session.state(), SessionState::Authenticated { .. }));
}

#[tokio::test]
async fn turns_accumulate_two_messages_each() {
    let (_, emora) = app(StubGateway::replying("reply"));
    let mut session = logged_in(&emora, "alice").await;
    let chat = emora.create_chat(&mut session, None, "education").await.unwrap();

    for n in 0..5 {
        emora
            .send_message(&mut session, chat.id, &format!("message {n}"))
            .await
            .unwrap();
    }

    let history = emora.chat_history(&mut session, chat.id).await.unwrap();
    assert_eq!(history.len(), 10);
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    assert_eq!(history, emora.chat_history(&mut session, chat.id).await.unwrap());
}
