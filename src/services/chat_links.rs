//! Chat link services - Emissione, validazione e revoca dei codici di invito

use crate::core::{AppError, AppState};
use crate::dtos::{ChatLinkDTO, ChatLinkValidationDTO, UserDTO};
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Genera un codice corto e URL-friendly da un UUID v4:
/// imprevedibile, 8 caratteri esadecimali maiuscoli
fn generate_code() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    uuid[..8].to_uppercase()
}

/// Emette un nuovo codice per il chiamante. Il codice precedente viene
/// sovrascritto e quindi implicitamente invalidato: per ogni utente è
/// valido solo il codice più recente.
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn issue_chat_link(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<ChatLinkDTO>, AppError> {
    debug!("Issuing new chat link");
    let code = generate_code();
    let expires_at = Utc::now() + state.chat_link_ttl;

    state
        .user
        .set_chat_link(&current_user.user_id, &code, &expires_at)
        .await?;

    info!("Chat link issued");
    Ok(Json(ChatLinkDTO {
        link: format!("/join/{code}"),
        code,
        expires_at,
    }))
}

/// Risolve un codice nel suo proprietario. Lettura pura: la scadenza è
/// verificata pigramente a tempo di validazione, nessuno sweep in
/// background. Un codice trovato ma scaduto fallisce con Gone, distinto
/// da NotFound per la messaggistica lato client.
pub(crate) async fn resolve_code(state: &AppState, code: &str) -> Result<User, AppError> {
    let normalized = code.trim().to_uppercase();

    let owner = state
        .user
        .find_by_chat_link_code(&normalized)
        .await?
        .ok_or_else(|| {
            warn!("Chat link not found");
            AppError::not_found("Chat link is invalid")
        })?;

    let link = owner
        .chat_link()
        .ok_or_else(|| AppError::not_found("Chat link is invalid"))?;

    if link.is_expired(Utc::now()) {
        warn!(owner_id = owner.user_id, "Chat link has expired");
        return Err(AppError::gone("Chat link has expired"));
    }

    Ok(owner)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn validate_chat_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Extension(current_user): Extension<User>,
) -> Result<Json<ChatLinkValidationDTO>, AppError> {
    debug!("Validating chat link");
    let owner = resolve_code(&state, &code).await?;

    if owner.user_id == current_user.user_id {
        warn!("Attempted to validate own chat link");
        return Err(AppError::bad_request("You cannot join your own chat link"));
    }

    // Solo il profilo pubblico del proprietario, mai campi privati
    Ok(Json(ChatLinkValidationDTO {
        owner: UserDTO::from(owner),
    }))
}

/// Revoca anticipata del proprio codice (logout, revoca esplicita)
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn invalidate_chat_link(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    debug!("Invalidating chat link");
    state.user.clear_chat_link(&current_user.user_id).await?;
    info!("Chat link invalidated");
    Ok(StatusCode::NO_CONTENT)
}
