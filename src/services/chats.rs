//! Chat services - Gestione delle conversazioni

use crate::core::{AppError, AppState};
use crate::dtos::{ChatSummaryDTO, CreateChatDTO, UserDTO};
use crate::entities::{Chat, User};
use crate::services::chat_links::resolve_code;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Costruisce la vista di una chat dal punto di vista di `viewer`:
/// l'altro partecipante, la cache last_message, il proprio contatore
async fn summarize_for(
    state: &AppState,
    chat: &Chat,
    viewer_id: i64,
) -> Result<ChatSummaryDTO, AppError> {
    let other_id = chat.other_participant(viewer_id);
    let other = state
        .user
        .find_by_id(&other_id)
        .await?
        .ok_or_else(|| AppError::internal_server_error("Participant not found"))?;
    let unread = state.chat.unread_count(&chat.chat_id, &viewer_id).await?;

    Ok(ChatSummaryDTO::new(chat, UserDTO::from(other), unread))
}

/// Chat attive dell'utente, ordinate per attività più recente
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ChatSummaryDTO>>, AppError> {
    debug!("Listing chats for user");
    let chats = state.chat.list_for_user(&current_user.user_id).await?;

    let mut summaries = Vec::with_capacity(chats.len());
    for chat in &chats {
        summaries.push(summarize_for(&state, chat, current_user.user_id).await?);
    }

    info!("Successfully retrieved {} chats", summaries.len());
    Ok(Json(summaries))
}

/// Lookup-or-create della chat con un altro utente. Ripetere la chiamata
/// (in entrambe le direzioni della coppia) ritorna sempre la stessa chat.
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateChatDTO>,
) -> Result<Json<ChatSummaryDTO>, AppError> {
    debug!("Opening chat with user {}", body.user_id);

    if body.user_id == current_user.user_id {
        warn!("Attempted to create chat with self");
        return Err(AppError::bad_request("Cannot create chat with yourself"));
    }

    let other = state
        .user
        .find_by_id(&body.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let chat = state
        .chat
        .get_or_create(current_user.user_id, other.user_id)
        .await?;

    info!(chat_id = chat.chat_id, "Chat ready");
    Ok(Json(summarize_for(&state, &chat, current_user.user_id).await?))
}

/// Bootstrap di una conversazione tramite codice di invito
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn join_chat_by_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Extension(current_user): Extension<User>,
) -> Result<Json<ChatSummaryDTO>, AppError> {
    debug!("Joining chat by link");
    let owner = resolve_code(&state, &code).await?;

    if owner.user_id == current_user.user_id {
        warn!("Self-join attempt on own chat link");
        return Err(AppError::bad_request("You cannot join your own chat link"));
    }

    let chat = state
        .chat
        .get_or_create(current_user.user_id, owner.user_id)
        .await?;

    info!(chat_id = chat.chat_id, owner_id = owner.user_id, "Joined chat via link");
    Ok(Json(summarize_for(&state, &chat, current_user.user_id).await?))
}

/// Soft delete della chat: disattivata, mai cancellata fisicamente
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, chat_id))]
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    debug!("Deactivating chat");
    state
        .chat
        .find_for_participant(&chat_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;

    state.chat.deactivate(&chat_id).await?;
    info!("Chat deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// Azzera il contatore non letti del chiamante; idempotente
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, chat_id))]
pub async fn mark_chat_read(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    debug!("Resetting unread counter");
    state
        .chat
        .find_for_participant(&chat_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;

    state
        .chat
        .reset_unread(&chat_id, &current_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
