//! Services module - Handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod chat_links;
pub mod chats;
pub mod messages;

// Re-exports per facilitare l'import
pub use chat_links::{invalidate_chat_link, issue_chat_link, validate_chat_link};
pub use chats::{create_chat, delete_chat, join_chat_by_link, list_chats, mark_chat_read};
pub use messages::{delete_message, get_chat_messages, mark_messages_read, send_message};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
