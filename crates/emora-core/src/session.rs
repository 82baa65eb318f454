//! Per-user conversation session.
//!
//! A [`Session`] is an explicit value owned by the caller and passed to every
//! [`crate::Emora`] operation. It moves `Anonymous → Authenticated →
//! ChatSelected` and drops back to `Anonymous` on logout or expiry.

use chrono::{DateTime, Utc};
use emora_types::{Chat, Identity};

use crate::error::{EmoraError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated {
        identity: Identity,
    },
    ChatSelected {
        identity: Identity,
        chat: Chat,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A fresh, logged-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session already bound to `identity`, valid until `expires_at`.
    #[must_use]
    pub fn authenticated(identity: Identity, expires_at: DateTime<Utc>) -> Self {
        Self {
            state: SessionState::Authenticated { identity },
            expires_at: Some(expires_at),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Anonymous => None,
            SessionState::Authenticated { identity } | SessionState::ChatSelected { identity, .. } => {
                Some(identity)
            }
        }
    }

    pub fn selected_chat(&self) -> Option<&Chat> {
        match &self.state {
            SessionState::ChatSelected { chat, .. } => Some(chat),
            _ => None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// The logged-in identity. An expired session is cleared first.
    pub fn require_identity(&mut self) -> Result<Identity> {
        if self.is_expired(Utc::now()) {
            self.logout();
        }
        self.identity().cloned().ok_or(EmoraError::Unauthenticated)
    }

    pub(crate) fn bind(&mut self, identity: Identity, expires_at: DateTime<Utc>) {
        self.state = SessionState::Authenticated { identity };
        self.expires_at = Some(expires_at);
    }

    /// Open `chat`. Chats owned by someone else are reported as missing.
    pub(crate) fn select(&mut self, chat: Chat) -> Result<()> {
        let identity = self.require_identity()?;
        if chat.user_id != identity.id {
            return Err(EmoraError::not_found("chat"));
        }
        self.state = SessionState::ChatSelected { identity, chat };
        Ok(())
    }

    pub fn logout(&mut self) {
        self.state = SessionState::Anonymous;
        self.expires_at = None;
    }
}
