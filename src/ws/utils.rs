//! WebSocket Utilities - Funzioni di supporto per il gateway

use crate::AppState;
use crate::dtos::ServerEvent;
use tracing::{debug, warn};

/// Invia un evento a tutti i membri della stanza tranne `except`.
/// Ritorna il numero di consegne riuscite. I membri il cui canale risulta
/// chiuso vengono semplicemente saltati: la pulizia è compito del loro
/// task di connessione.
pub fn fanout_to_room(state: &AppState, chat_id: i64, except: i64, event: &ServerEvent) -> usize {
    let mut sent = 0usize;
    for member in state.rooms.members(&chat_id) {
        if member == except {
            continue;
        }
        if state.presence.send_if_online(&member, event.clone()) {
            sent += 1;
        }
    }
    debug!(chat_id, receivers = sent, "Event fanned out to room");
    sent
}

/// Invia un evento di errore a un utente specifico, se connesso
pub fn send_error_to_user(state: &AppState, user_id: i64, code: u16, message: impl Into<String>) {
    let delivered = state.presence.send_if_online(
        &user_id,
        ServerEvent::Error {
            code,
            message: message.into(),
        },
    );
    if !delivered {
        warn!(user_id, code, "Error event not delivered, user offline");
    }
}

/// Tronca a `max` caratteri rispettando i confini UTF-8
pub fn truncate_chars(content: &str, max: usize) -> String {
    content.chars().take(max).collect()
}
