//! WebSocket Event DTOs - Eventi tipizzati del protocollo real-time
//!
//! Tagged union per gli eventi WebSocket. Serde serializza come:
//! { "event": "message:send", "data": { ... } }
//! Ogni evento inbound diventa una variante di `ClientEvent` e viene
//! smistato da un singolo match nel gateway, senza handler impliciti.

use crate::dtos::UserDTO;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Eventi client -> server
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "chat:join", rename_all = "camelCase")]
    ChatJoin { chat_id: i64 },

    #[serde(rename = "chat:leave", rename_all = "camelCase")]
    ChatLeave { chat_id: i64 },

    #[serde(rename = "message:send", rename_all = "camelCase")]
    MessageSend {
        chat_id: i64,
        content: String,
        // dichiarato dal client ma mai usato per il routing: il
        // destinatario autorevole è l'altro partecipante della chat
        recipient_id: Option<i64>,
        temp_id: Option<String>,
    },

    #[serde(rename = "typing:start", rename_all = "camelCase")]
    TypingStart { chat_id: i64 },

    #[serde(rename = "typing:stop", rename_all = "camelCase")]
    TypingStop { chat_id: i64 },

    #[serde(rename = "message:read", rename_all = "camelCase")]
    MessageRead {
        chat_id: i64,
        #[serde(default)]
        message_ids: Option<Vec<i64>>,
    },
}

/// Eventi server -> client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:receive", rename_all = "camelCase")]
    MessageReceive {
        chat_id: i64,
        content: String,
        sender: UserDTO,
        timestamp: DateTime<Utc>,
        temp_id: Option<String>,
    },

    /// Consegna fuori-stanza: il destinatario è online ma non sta
    /// guardando questa conversazione
    #[serde(rename = "message:notification", rename_all = "camelCase")]
    MessageNotification {
        chat_id: i64,
        sender: UserDTO,
        preview: String,
    },

    #[serde(rename = "typing:start", rename_all = "camelCase")]
    TypingStart {
        chat_id: i64,
        user_id: i64,
        username: String,
    },

    #[serde(rename = "typing:stop", rename_all = "camelCase")]
    TypingStop { chat_id: i64, user_id: i64 },

    #[serde(rename = "message:read", rename_all = "camelCase")]
    MessageRead {
        chat_id: i64,
        user_id: i64,
        message_ids: Vec<i64>,
    },

    #[serde(rename = "user:online", rename_all = "camelCase")]
    UserOnline { user_id: i64 },

    #[serde(rename = "user:offline", rename_all = "camelCase")]
    UserOffline {
        user_id: i64,
        last_seen: DateTime<Utc>,
    },

    #[serde(rename = "error", rename_all = "camelCase")]
    Error { code: u16, message: String },
}
