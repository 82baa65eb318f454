use std::sync::Arc;

use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};

use emora_core::{Emora, EmoraError, Session};
use emora_types::Identity;
use emora_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub emora: Emora,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = state.emora.register(req).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = Session::new();
    let identity = state
        .emora
        .login(&mut session, &req.username, &req.password)
        .await?;

    let exp = token_expiry(&session)?;
    let token = create_token(&state.jwt_secret, &identity, exp)
        .map_err(|e| EmoraError::Storage(e.context("failed to sign session token")))?;

    Ok(Json(LoginResponse {
        user_id: identity.id,
        name: identity.name,
        username: identity.username,
        token,
    }))
}

/// The session's expiry as a JWT `exp`. A session without one never gets a
/// token.
fn token_expiry(session: &Session) -> Result<usize, EmoraError> {
    let at = session
        .expires_at()
        .ok_or_else(|| EmoraError::Storage(anyhow!("session has no expiry")))?;
    usize::try_from(at.timestamp())
        .map_err(|_| EmoraError::Storage(anyhow!("session expiry {at} is out of range")))
}

pub fn create_token(secret: &str, identity: &Identity, exp: usize) -> anyhow::Result<String> {
    let claims = Claims {
        sub: identity.id,
        username: identity.username.clone(),
        name: identity.name.clone(),
        exp,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
