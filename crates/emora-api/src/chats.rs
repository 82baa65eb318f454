use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use emora_core::Session;
use emora_types::ChatSummary;
use emora_types::api::{
    ChatListResponse, CreateChatRequest, HistoryResponse, SendMessageRequest, TurnResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(mut session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let chats = state.emora.list_chats(&mut session).await?;
    Ok(Json(ChatListResponse { chats }))
}

pub async fn create_chat(
    State(state): State<AppState>,
    Extension(mut session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<CreateChatRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let chat = state
        .emora
        .create_chat(&mut session, req.title.as_deref(), &req.category)
        .await?;
    Ok((StatusCode::CREATED, Json(ChatSummary::from(chat))))
}

pub async fn get_messages(
    State(state): State<AppState>,
    WithRejection(Path(chat_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(mut session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state.emora.chat_history(&mut session, chat_id).await?;
    Ok(Json(HistoryResponse { messages }))
}

/// Blocks until the assistant answers; the turn is stored only on success.
pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Path(chat_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(mut session): Extension<Session>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, assistant) = state
        .emora
        .send_message(&mut session, chat_id, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(TurnResponse { user, assistant })))
}
