//! User entity - Entità utente con lo stato di presenza e il chat link

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub chat_link_code: Option<String>,
    pub chat_link_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Chat link corrente, se entrambe le colonne sono valorizzate
    pub fn chat_link(&self) -> Option<ChatLink> {
        match (&self.chat_link_code, self.chat_link_expires_at) {
            (Some(code), Some(expires_at)) => Some(ChatLink {
                code: code.clone(),
                expires_at,
            }),
            _ => None,
        }
    }
}

/// Codice di invito temporaneo: valido solo finché è il codice corrente
/// del proprietario e non è scaduto
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatLink {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl ChatLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
