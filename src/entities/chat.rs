//! Chat entity - Conversazione privata tra due utenti
//!
//! I partecipanti sono salvati come coppia ordinata (user_low, user_high)
//! così la coppia non ordinata {A, B} ha una sola rappresentazione e
//! l'indice univoco parziale può impedire chat attive duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Chat {
    pub chat_id: i64,
    pub user_low: i64,
    pub user_high: i64,
    // Cache denormalizzata dell'ultimo messaggio, aggiornata best-effort
    // dopo l'append sul ledger. Mai fonte di verità per il contenuto.
    pub last_message_content: Option<String>,
    pub last_message_sender_id: Option<i64>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.user_low == user_id || self.user_high == user_id
    }

    /// L'altro partecipante rispetto a `user_id`
    pub fn other_participant(&self, user_id: i64) -> i64 {
        if self.user_low == user_id {
            self.user_high
        } else {
            self.user_low
        }
    }
}

/// Normalizza una coppia non ordinata di utenti in (low, high)
pub fn sorted_pair(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}
