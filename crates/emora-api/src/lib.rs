pub mod auth;
pub mod chats;
pub mod error;
pub mod middleware;
pub mod routes;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
