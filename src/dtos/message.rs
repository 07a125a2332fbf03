//! Message DTOs - Data Transfer Objects per messaggi

use crate::entities::{Message, ReadReceipt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Messaggio come esposto al client, con le ricevute di lettura
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageDTO {
    pub message_id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub read_by: Vec<ReadReceiptDTO>,
}

impl MessageDTO {
    pub fn new(message: Message, read_by: Vec<ReadReceiptDTO>) -> Self {
        Self {
            message_id: message.message_id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            is_deleted: message.is_deleted,
            created_at: message.created_at,
            read_by,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceiptDTO {
    pub user_id: i64,
    pub read_at: DateTime<Utc>,
}

impl From<ReadReceipt> for ReadReceiptDTO {
    fn from(value: ReadReceipt) -> Self {
        Self {
            user_id: value.user_id,
            read_at: value.read_at,
        }
    }
}

/// DTO per l'append di un nuovo messaggio via REST
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Message content must be between 1 and 5000 characters"
    ))]
    pub content: String,
}

/// DTO per marcare messaggi come letti; senza id si applica a tutti i
/// messaggi non letti del chiamante nella chat
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadDTO {
    #[serde(default)]
    pub message_ids: Option<Vec<i64>>,
}

/// Pagina di messaggi con i metadati di paginazione
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessagesPageDTO {
    pub messages: Vec<MessageDTO>,
    pub pagination: PaginationDTO,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDTO {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_messages: i64,
    pub has_more: bool,
}
