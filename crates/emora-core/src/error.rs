use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum EmoraError {
    #[error("{0}")]
    Validation(String),

    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("wrong password")]
    InvalidCredential,

    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    #[error("not logged in")]
    Unauthenticated,

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error("assistant unavailable: {0}")]
    Gateway(#[from] GatewayError),
}

impl EmoraError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Storage and gateway failures may succeed when the caller tries again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Gateway(_))
    }
}

pub type Result<T> = std::result::Result<T, EmoraError>;
