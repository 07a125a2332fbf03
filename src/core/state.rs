//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, la configurazione e lo stato effimero
//! (registro presenze, membership delle stanze) condiviso tra route,
//! middleware e task WebSocket.

use crate::repositories::{ChatRepository, MessageRepository, UserRepository};
use crate::ws::presence::PresenceRegistry;
use crate::ws::rooms::RoomMap;
use chrono::Duration;
use sqlx::SqlitePool;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti e dei chat link
    pub user: UserRepository,

    /// Repository per la gestione delle conversazioni
    pub chat: ChatRepository,

    /// Repository per la gestione dei messaggi e delle ricevute di lettura
    pub msg: MessageRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// TTL dei codici di invito
    pub chat_link_ttl: Duration,

    /// Registro autorevole degli utenti attualmente connessi.
    /// Mutato solo dal gateway (register/unregister).
    pub presence: PresenceRegistry,

    /// Membership effimera delle stanze: una stanza = una conversazione
    pub rooms: RoomMap,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito.
    pub fn new(pool: SqlitePool, jwt_secret: String, chat_link_ttl_minutes: i64) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            chat: ChatRepository::new(pool.clone()),
            msg: MessageRepository::new(pool),
            jwt_secret,
            chat_link_ttl: Duration::minutes(chat_link_ttl_minutes),
            presence: PresenceRegistry::new(),
            rooms: RoomMap::new(),
        }
    }
}
