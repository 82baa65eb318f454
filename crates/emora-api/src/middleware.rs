use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::DateTime;
use jsonwebtoken::{DecodingKey, Validation, decode};

use emora_core::{EmoraError, Session};
use emora_types::Identity;
use emora_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and validate the bearer JWT, then attach an authenticated
/// [`Session`] for the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(EmoraError::Unauthenticated)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| EmoraError::Unauthenticated)?;

    let session = session_from_claims(token_data.claims)?;
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

fn session_from_claims(claims: Claims) -> Result<Session, EmoraError> {
    let expires_at =
        DateTime::from_timestamp(claims.exp as i64, 0).ok_or(EmoraError::Unauthenticated)?;
    Ok(Session::authenticated(
        Identity {
            id: claims.sub,
            name: claims.name,
            username: claims.username,
        },
        expires_at,
    ))
}
