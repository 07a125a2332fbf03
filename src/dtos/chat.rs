//! Chat DTOs - Data Transfer Objects per le conversazioni

use crate::dtos::UserDTO;
use crate::entities::Chat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vista di una chat dal punto di vista di un partecipante: l'altro
/// partecipante, la cache dell'ultimo messaggio e il proprio contatore
/// dei non letti.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummaryDTO {
    pub chat_id: i64,
    pub participant: UserDTO,
    pub last_message: Option<LastMessageDTO>,
    pub unread_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl ChatSummaryDTO {
    pub fn new(chat: &Chat, participant: UserDTO, unread_count: i64) -> Self {
        Self {
            chat_id: chat.chat_id,
            participant,
            last_message: LastMessageDTO::from_chat(chat),
            unread_count,
            updated_at: chat.updated_at,
        }
    }
}

/// Cache denormalizzata dell'ultimo messaggio, eventualmente consistente
/// con il ledger dei messaggi
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageDTO {
    pub content: String,
    pub sender_id: i64,
    pub timestamp: DateTime<Utc>,
}

impl LastMessageDTO {
    fn from_chat(chat: &Chat) -> Option<Self> {
        match (
            &chat.last_message_content,
            chat.last_message_sender_id,
            chat.last_message_at,
        ) {
            (Some(content), Some(sender_id), Some(timestamp)) => Some(Self {
                content: content.clone(),
                sender_id,
                timestamp,
            }),
            _ => None,
        }
    }
}

/// DTO per aprire (o ritrovare) una chat con un altro utente
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatDTO {
    pub user_id: i64,
}
