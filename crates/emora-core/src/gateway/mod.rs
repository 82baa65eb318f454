pub mod gemini;

pub use gemini::GeminiGateway;

use emora_types::{Message, Role};
use thiserror::Error;

/// One prior (or the new) turn as handed to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Why the assistant could not produce a reply. Never stored as chat content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("assistant API key is not configured")]
    MissingCredential,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("assistant returned an empty reply")]
    EmptyReply,
}

/// The text-generation service behind a chat.
///
/// `history` is ordered oldest first and ends with the new user message.
#[async_trait::async_trait]
pub trait AssistantGateway: Send + Sync {
    async fn reply(
        &self,
        history: &[HistoryEntry],
        instruction: &str,
    ) -> Result<String, GatewayError>;
}
