//! Emora conversation core.
//!
//! - **Credential store**: registration and password verification
//! - **Conversation store**: chats and their append-only message history
//! - **Persona**: category to system instruction
//! - **Session**: explicit per-user state driving the stores
//! - **Gateway**: the assistant model behind a narrow trait

pub mod conversations;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod password;
pub mod persona;
pub mod service;
pub mod session;

pub use conversations::ConversationStore;
pub use credentials::CredentialStore;
pub use error::{EmoraError, Result};
pub use gateway::{AssistantGateway, GatewayError, HistoryEntry};
pub use persona::Persona;
pub use service::Emora;
pub use session::{Session, SessionState};

use std::sync::Arc;

use emora_db::Database;

/// Runs blocking storage or hashing work off the async runtime.
pub(crate) async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking join error: {}", e);
            EmoraError::Storage(anyhow::anyhow!("background task failed: {e}"))
        })?
}
