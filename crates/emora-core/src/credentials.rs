use std::sync::Arc;

use chrono::Utc;
use emora_db::Database;
use emora_db::models::{UserRow, format_timestamp};
use emora_types::api::RegisterRequest;
use emora_types::{Identity, UserId};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EmoraError, Result};
use crate::password::{MIN_PASSWORD_LEN, hash_password, verify_password};

pub const MIN_AGE: i64 = 13;

/// User accounts and password verification.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserId> {
        validate_registration(&req)?;

        let user_id = Uuid::new_v4();
        let username = req.username.clone();

        let created = crate::blocking(&self.db, move |db| {
            // Hash with Argon2id off the async runtime, then insert
            let password_hash = hash_password(&req.password)?;
            let row = UserRow {
                id: user_id.to_string(),
                name: req.name,
                age: req.age,
                dob: req.dob.format("%Y-%m-%d").to_string(),
                guardian_email: req.guardian_email,
                guardian_phone: req.guardian_phone,
                username: req.username,
                password_hash,
                created_at: format_timestamp(Utc::now()),
            };
            Ok(db.create_user(&row)?)
        })
        .await?;

        if !created {
            return Err(EmoraError::DuplicateUsername(username));
        }

        info!(%user_id, "Registered user {}", username);
        Ok(user_id)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Identity> {
        let username = username.to_string();
        let password = password.to_string();

        crate::blocking(&self.db, move |db| {
            let row = db
                .get_user_by_username(&username)?
                .ok_or_else(|| EmoraError::not_found("user"))?;

            if !verify_password(&password, &row.password_hash) {
                warn!("Failed login for {}", username);
                return Err(EmoraError::InvalidCredential);
            }

            Ok(Identity {
                id: parse_id(&row.id)?,
                name: row.name,
                username: row.username,
            })
        })
        .await
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<()> {
    if req.age < MIN_AGE {
        return Err(EmoraError::validation(format!(
            "Must be at least {MIN_AGE} to sign up."
        )));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EmoraError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    if req.username.trim().is_empty() {
        return Err(EmoraError::validation("Username must not be empty."));
    }
    Ok(())
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .map_err(|e| EmoraError::Storage(anyhow::anyhow!("corrupt id {:?}: {}", raw, e)))
}
