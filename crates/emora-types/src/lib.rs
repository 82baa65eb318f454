pub mod api;
pub mod models;

pub use models::{Category, Chat, ChatId, ChatSummary, Identity, Message, MessageId, Role, User, UserId};
