//! User DTOs - Profilo pubblico dell'utente
//!
//! Contiene solo i campi esponibili ad altri utenti: mai il chat link
//! o altri campi privati del profilo.

use crate::entities::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDTO {
    pub user_id: i64,
    pub username: String,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username,
            is_online: value.is_online,
            last_seen: value.last_seen,
        }
    }
}

impl From<&User> for UserDTO {
    fn from(value: &User) -> Self {
        Self {
            user_id: value.user_id,
            username: value.username.clone(),
            is_online: value.is_online,
            last_seen: value.last_seen,
        }
    }
}
