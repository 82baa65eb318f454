use std::sync::Arc;

use emora_db::Database;
use emora_db::models::{ChatRow, MessageRow, format_timestamp, now_timestamp, parse_timestamp};
use emora_types::{Category, Chat, ChatId, ChatSummary, Message, Role, UserId};
use tracing::debug;
use uuid::Uuid;

use crate::credentials::parse_id;
use crate::error::{EmoraError, Result};
use crate::persona::Persona;

/// Chats and their append-only message history.
#[derive(Clone)]
pub struct ConversationStore {
    db: Arc<Database>,
}

impl ConversationStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// A user's chats, newest first. Empty when the user has none.
    pub async fn list_chats(&self, user_id: UserId) -> Result<Vec<ChatSummary>> {
        let rows = crate::blocking(&self.db, move |db| Ok(db.list_chats(&user_id.to_string())?)).await?;
        rows.into_iter()
            .map(|row| chat_from_row(row).map(ChatSummary::from))
            .collect()
    }

    /// Creates a chat. A missing or blank title becomes `Chat {n}`, numbered
    /// after the user's existing chats.
    pub async fn create_chat(
        &self,
        user_id: UserId,
        title: Option<&str>,
        category: &str,
    ) -> Result<Chat> {
        let category: Category = category
            .parse()
            .map_err(|e: emora_types::models::UnknownCategory| EmoraError::validation(e.to_string()))?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        crate::blocking(&self.db, move |db| {
            let owner = user_id.to_string();
            let title = match title {
                Some(title) => title,
                None => format!("Chat {}", db.count_chats(&owner)? + 1),
            };
            let chat = Chat {
                id: Uuid::new_v4(),
                user_id,
                title,
                category,
                created_at: now_timestamp(),
            };
            db.insert_chat(&ChatRow {
                id: chat.id.to_string(),
                user_id: owner,
                title: chat.title.clone(),
                category: category.as_str().to_string(),
                created_at: format_timestamp(chat.created_at),
            })?;
            debug!(chat_id = %chat.id, %category, "Created chat");
            Ok(chat)
        })
        .await
    }

    pub async fn get_chat(&self, chat_id: ChatId) -> Result<Chat> {
        let row = crate::blocking(&self.db, move |db| Ok(db.get_chat(&chat_id.to_string())?))
            .await?
            .ok_or_else(|| EmoraError::not_found("chat"))?;
        chat_from_row(row)
    }

    /// Current persisted history, oldest first. Each call re-reads storage.
    pub async fn get_chat_history(&self, chat_id: ChatId) -> Result<Vec<Message>> {
        let rows = crate::blocking(&self.db, move |db| Ok(db.get_messages(&chat_id.to_string())?)).await?;
        rows.into_iter().map(message_from_row).collect()
    }

    /// Appends one turn: the user message followed by the assistant reply,
    /// committed together.
    pub async fn append_turn(
        &self,
        chat_id: ChatId,
        user_content: &str,
        assistant_content: &str,
    ) -> Result<(Message, Message)> {
        let user_content = user_content.to_string();
        let assistant_content = assistant_content.to_string();

        crate::blocking(&self.db, move |db| {
            let cid = chat_id.to_string();
            if db.get_chat(&cid)?.is_none() {
                return Err(EmoraError::not_found("chat"));
            }

            let user_at = now_timestamp();
            let user = Message {
                id: Uuid::new_v4(),
                chat_id,
                role: Role::User,
                content: user_content,
                created_at: user_at,
            };
            let assistant = Message {
                id: Uuid::new_v4(),
                chat_id,
                role: Role::Assistant,
                content: assistant_content,
                created_at: now_timestamp().max(user_at),
            };

            db.insert_turn(&message_to_row(&user), &message_to_row(&assistant))?;
            Ok((user, assistant))
        })
        .await
    }
}

fn chat_from_row(row: ChatRow) -> Result<Chat> {
    // A stored category must still name a persona
    let persona = Persona::resolve(&row.category)?;
    Ok(Chat {
        id: parse_id(&row.id)?,
        user_id: parse_id(&row.user_id)?,
        title: row.title,
        category: persona.category,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message> {
    let role = row
        .role
        .parse::<Role>()
        .map_err(|e| EmoraError::Storage(anyhow::anyhow!(e)))?;
    Ok(Message {
        id: parse_id(&row.id)?,
        chat_id: parse_id(&row.chat_id)?,
        role,
        content: row.content,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn message_to_row(message: &Message) -> MessageRow {
    MessageRow {
        id: message.id.to_string(),
        chat_id: message.chat_id.to_string(),
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
        created_at: format_timestamp(message.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (Arc<Database>, ConversationStore) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        (db.clone(), ConversationStore::new(db))
    }

    #[tokio::test]
    async fn list_is_empty_for_new_user() {
        let (_, store) = store();
        assert!(store.list_chats(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_creates_no_chat() {
        let (db, store) = store();
        let user = Uuid::new_v4();

        let err = store.create_chat(user, Some("Hobbies"), "sports").await.unwrap_err();
        assert!(matches!(err, EmoraError::Validation(_)));
        assert_eq!(db.count_chats(&user.to_string()).unwrap(), 0);
    }

    #[tokio::test]
    async fn default_titles_are_numbered_per_user() {
        let (_, store) = store();
        let user = Uuid::new_v4();

        let first = store.create_chat(user, None, "personal").await.unwrap();
        let second = store.create_chat(user, Some("   "), "ethical").await.unwrap();
        let named = store.create_chat(user, Some("Exams"), "education").await.unwrap();
        let other = store.create_chat(Uuid::new_v4(), None, "emotional").await.unwrap();

        assert_eq!(first.title, "Chat 1");
        assert_eq!(second.title, "Chat 2");
        assert_eq!(named.title, "Exams");
        assert_eq!(other.title, "Chat 1");
    }

    #[tokio::test]
    async fn titles_need_not_be_unique() {
        let (_, store) = store();
        let user = Uuid::new_v4();
        store.create_chat(user, Some("Same"), "personal").await.unwrap();
        store.create_chat(user, Some("Same"), "personal").await.unwrap();
        assert_eq!(store.list_chats(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn chats_are_listed_newest_first() {
        let (_, store) = store();
        let user = Uuid::new_v4();
        let a = store.create_chat(user, Some("a"), "personal").await.unwrap();
        let b = store.create_chat(user, Some("b"), "education").await.unwrap();

        let ids: Vec<ChatId> = store.list_chats(user).await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn history_grows_by_two_per_turn_in_order() {
        let (_, store) = store();
        let chat = store.create_chat(Uuid::new_v4(), None, "education").await.unwrap();

        for n in 1..=3 {
            store
                .append_turn(chat.id, &format!("question {n}"), &format!("answer {n}"))
                .await
                .unwrap();
            assert_eq!(store.get_chat_history(chat.id).await.unwrap().len(), 2 * n);
        }

        let history = store.get_chat_history(chat.id).await.unwrap();
        assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(history[4].content, "question 3");
        assert_eq!(history[5].content, "answer 3");
    }

    #[tokio::test]
    async fn history_reads_are_repeatable() {
        let (_, store) = store();
        let chat = store.create_chat(Uuid::new_v4(), None, "ethical").await.unwrap();
        store.append_turn(chat.id, "q", "a").await.unwrap();

        let first = store.get_chat_history(chat.id).await.unwrap();
        let second = store.get_chat_history(chat.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn returned_values_match_what_is_read_back() {
        let (_, store) = store();
        let user = Uuid::new_v4();
        let chat = store.create_chat(user, Some("Notes"), "personal").await.unwrap();
        assert_eq!(store.list_chats(user).await.unwrap(), vec![ChatSummary::from(chat.clone())]);
        assert_eq!(store.get_chat(chat.id).await.unwrap(), chat);

        let (question, answer) = store.append_turn(chat.id, "q", "a").await.unwrap();
        assert_eq!(store.get_chat_history(chat.id).await.unwrap(), vec![question, answer]);
    }

    #[test]
    fn stored_category_outside_the_set_is_reported() {
        let row = ChatRow {
            id: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4().to_string(),
            title: "Old".into(),
            category: "sports".into(),
            created_at: "2025-01-01T08:00:00.000001Z".into(),
        };
        assert!(matches!(
            chat_from_row(row),
            Err(EmoraError::UnknownCategory(name)) if name == "sports"
        ));
    }

    #[tokio::test]
    async fn append_to_unknown_chat_is_not_found() {
        let (_, store) = store();
        let err = store.append_turn(Uuid::new_v4(), "q", "a").await.unwrap_err();
        assert!(matches!(err, EmoraError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_chat_lookup_is_not_found() {
        let (_, store) = store();
        assert!(matches!(
            store.get_chat(Uuid::new_v4()).await,
            Err(EmoraError::NotFound(_))
        ));
        assert!(store.get_chat_history(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
