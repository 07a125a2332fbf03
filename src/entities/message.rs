//! Message entity - Entità messaggio e ricevute di lettura

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contenuto sostitutivo dei messaggi cancellati. L'id, il mittente e il
/// timestamp originali vengono preservati.
pub const TOMBSTONE: &str = "This message was deleted";

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub message_id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub is_deleted: bool,
    // il server si aspetta una stringa litterale iso8601 che viene parsata in oggetto DateTime di tipo UTC
    // la conversione viene fatta in automatico da serde, la feature è stata abilitata
    pub created_at: DateTime<Utc>,
}

/// Ricevuta di lettura: una volta inserita non viene mai rimossa
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ReadReceipt {
    pub message_id: i64,
    pub user_id: i64,
    pub read_at: DateTime<Utc>,
}
