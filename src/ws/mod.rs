//! WebSocket Module - Gateway real-time
//!
//! Questo modulo gestisce le connessioni WebSocket per la comunicazione in tempo reale
//! tra client e server. Include:
//! - Gestione upgrade HTTP -> WebSocket (autenticata dal middleware JWT)
//! - Gestione connessioni (split sender/receiver, task di lettura e scrittura)
//! - Registro presenze autorevole (presence)
//! - Membership delle stanze (rooms)
//! - Dispatch tipizzato degli eventi inbound (event_handlers)

pub mod connection;
pub mod event_handlers;
pub mod presence;
pub mod rooms;
pub mod utils;

// Re-exports pubblici
pub use connection::handle_socket;
pub use presence::{ConnSignal, PresenceRegistry};
pub use rooms::RoomMap;

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Limite di lunghezza del contenuto di un messaggio, in caratteri
pub const MAX_CONTENT_CHARS: usize = 5000;

/// Lunghezza della preview nelle notifiche fuori-stanza
pub const NOTIFICATION_PREVIEW_CHARS: usize = 50;

/// Lunghezza della preview nella cache last_message della chat
pub const LAST_MESSAGE_PREVIEW_CHARS: usize = 100;

/// Entry point per gestire richieste di upgrade WebSocket.
/// L'autenticazione è già avvenuta nel middleware: una connessione senza
/// token valido non arriva mai qui.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, current_user))
}
