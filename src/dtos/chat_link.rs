//! Chat link DTOs - Data Transfer Objects per i codici di invito

use crate::dtos::UserDTO;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risposta all'emissione di un nuovo codice
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatLinkDTO {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub link: String,
}

/// Risposta alla validazione: solo il profilo pubblico del proprietario
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatLinkValidationDTO {
    pub owner: UserDTO,
}
