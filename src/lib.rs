//! Server library - espone i moduli principali per i test

pub mod core;
pub mod db;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{any, delete, get, post, put},
};
use std::sync::Arc;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::authentication_middleware;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/chat-link", configure_chat_link_routes(state.clone()))
        .nest("/chats", configure_chat_routes(state.clone()))
        .nest("/messages", configure_message_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .with_state(state)
}

/// Configura le routes per i codici di invito
fn configure_chat_link_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", post(issue_chat_link).delete(invalidate_chat_link))
        .route("/{code}", get(validate_chat_link))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per le conversazioni e la loro storia
fn configure_chat_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_chats).post(create_chat))
        .route("/join/{code}", post(join_chat_by_link))
        .route("/{chat_id}", delete(delete_chat))
        .route("/{chat_id}/read", put(mark_chat_read))
        .route(
            "/{chat_id}/messages",
            get(get_chat_messages).post(send_message),
        )
        .route("/{chat_id}/messages/read", put(mark_messages_read))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per i singoli messaggi
fn configure_message_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/{message_id}", delete(delete_message))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
