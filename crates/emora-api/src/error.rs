use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use emora_core::EmoraError;
use emora_types::api::ErrorResponse;
use tracing::error;

/// Maps core failures onto HTTP. Validation and credential problems carry
/// their message to the user; storage and assistant details stay in the logs.
#[derive(Debug)]
pub struct ApiError(pub EmoraError);

impl From<EmoraError> for ApiError {
    fn from(err: EmoraError) -> Self {
        Self(err)
    }
}

/// Malformed request bodies go through the same JSON error shape as
/// validation failures.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(EmoraError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(EmoraError::validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EmoraError::Validation(_) | EmoraError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            EmoraError::DuplicateUsername(_) => StatusCode::CONFLICT,
            EmoraError::NotFound(_) => StatusCode::NOT_FOUND,
            EmoraError::InvalidCredential | EmoraError::Unauthenticated => StatusCode::UNAUTHORIZED,
            EmoraError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            EmoraError::Gateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            EmoraError::Storage(e) => {
                error!("Storage failure: {:#}", e);
                "Storage is temporarily unavailable, please try again.".to_string()
            }
            EmoraError::Gateway(e) => {
                error!("Assistant failure: {}", e);
                "The assistant is unavailable right now, please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message(),
            retryable: self.0.is_retryable(),
        };
        (self.status(), Json(body)).into_response()
    }
}
