use std::sync::Arc;

use chrono::{Duration, Utc};
use emora_db::Database;
use emora_types::api::RegisterRequest;
use emora_types::{Chat, ChatId, ChatSummary, Identity, Message, UserId};
use tracing::{info, warn};

use crate::conversations::ConversationStore;
use crate::credentials::CredentialStore;
use crate::error::{EmoraError, Result};
use crate::gateway::{AssistantGateway, HistoryEntry};
use crate::persona::Persona;
use crate::session::Session;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Entry point for the presentation layer. Every call that needs a logged-in
/// user takes the caller's [`Session`].
#[derive(Clone)]
pub struct Emora {
    credentials: CredentialStore,
    conversations: ConversationStore,
    gateway: Arc<dyn AssistantGateway>,
    session_ttl: Duration,
}

impl Emora {
    pub fn new(db: Arc<Database>, gateway: Arc<dyn AssistantGateway>) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone()),
            conversations: ConversationStore::new(db),
            gateway,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserId> {
        self.credentials.register(req).await
    }

    /// Verifies the credentials and binds the session to the user.
    /// A failed attempt leaves the session as it was.
    pub async fn login(&self, session: &mut Session, username: &str, password: &str) -> Result<Identity> {
        let identity = self.credentials.authenticate(username, password).await?;
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| EmoraError::Storage(anyhow::anyhow!("session lifetime out of range")))?;
        session.bind(identity.clone(), expires_at);
        info!(user_id = %identity.id, "Session started");
        Ok(identity)
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some(identity) = session.identity() {
            info!(user_id = %identity.id, "Session ended");
        }
        session.logout();
    }

    pub async fn list_chats(&self, session: &mut Session) -> Result<Vec<ChatSummary>> {
        let identity = session.require_identity()?;
        self.conversations.list_chats(identity.id).await
    }

    /// Creates a chat for the session's user and opens it.
    pub async fn create_chat(
        &self,
        session: &mut Session,
        title: Option<&str>,
        category: &str,
    ) -> Result<Chat> {
        let identity = session.require_identity()?;
        let chat = self
            .conversations
            .create_chat(identity.id, title, category)
            .await?;
        session.select(chat.clone())?;
        Ok(chat)
    }

    pub async fn select_chat(&self, session: &mut Session, chat_id: ChatId) -> Result<Chat> {
        session.require_identity()?;
        let chat = self.conversations.get_chat(chat_id).await?;
        session.select(chat.clone())?;
        Ok(chat)
    }

    /// History of one of the session user's chats, oldest first.
    pub async fn chat_history(&self, session: &mut Session, chat_id: ChatId) -> Result<Vec<Message>> {
        self.select_chat(session, chat_id).await?;
        self.conversations.get_chat_history(chat_id).await
    }

    /// Runs one turn: history and persona go to the assistant, and only a
    /// genuine reply is persisted together with the user's message. On a
    /// gateway failure nothing is written and the error is returned.
    pub async fn send_message(
        &self,
        session: &mut Session,
        chat_id: ChatId,
        text: &str,
    ) -> Result<(Message, Message)> {
        if text.trim().is_empty() {
            return Err(EmoraError::validation("Message must not be empty."));
        }

        let chat = self.select_chat(session, chat_id).await?;
        let history = self.conversations.get_chat_history(chat.id).await?;
        let persona = Persona::for_category(chat.category);

        let mut entries: Vec<HistoryEntry> = history.iter().map(HistoryEntry::from).collect();
        entries.push(HistoryEntry::user(text));

        let reply = match self.gateway.reply(&entries, persona.instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(chat_id = %chat.id, "Assistant call failed: {}", e);
                return Err(EmoraError::Gateway(e));
            }
        };

        self.conversations.append_turn(chat.id, text, &reply).await
    }
}
