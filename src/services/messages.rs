//! Message services - Storia dei messaggi, append REST, ricevute, cancellazione

use crate::core::{AppError, AppState};
use crate::dtos::{
    CreateMessageDTO, MarkReadDTO, MessageDTO, MessagesPageDTO, MessagesQuery, PaginationDTO,
    ReadReceiptDTO,
};
use crate::entities::User;
use crate::ws::LAST_MESSAGE_PREVIEW_CHARS;
use crate::ws::utils::truncate_chars;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

/// Storia paginata: la pagina 1 è sempre quella con i messaggi più
/// recenti, in ordine vecchio -> nuovo dentro la pagina
#[instrument(skip(state, current_user, params), fields(user_id = %current_user.user_id, chat_id))]
pub async fn get_chat_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    Query(params): Query<MessagesQuery>,
    Extension(current_user): Extension<User>,
) -> Result<Json<MessagesPageDTO>, AppError> {
    debug!("Fetching chat messages");
    state
        .chat
        .find_for_participant(&chat_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let messages = state.msg.page(&chat_id, page, limit).await?;
    let total_messages = state.msg.count_for_chat(&chat_id).await?;
    let total_pages = (total_messages + limit - 1) / limit;

    // Ricevute raggruppate per messaggio, in memoria
    let mut reads_by_message: HashMap<i64, Vec<ReadReceiptDTO>> = HashMap::new();
    for read in state.msg.reads_for_chat(&chat_id).await? {
        reads_by_message
            .entry(read.message_id)
            .or_default()
            .push(ReadReceiptDTO::from(read));
    }

    let messages_dto: Vec<MessageDTO> = messages
        .into_iter()
        .map(|m| {
            let reads = reads_by_message.remove(&m.message_id).unwrap_or_default();
            MessageDTO::new(m, reads)
        })
        .collect();

    info!("Retrieved {} messages for chat", messages_dto.len());
    Ok(Json(MessagesPageDTO {
        messages: messages_dto,
        pagination: PaginationDTO {
            current_page: page,
            total_pages,
            total_messages,
            has_more: page < total_pages,
        },
    }))
}

/// Append via REST: percorso di sola durabilità, il fanout real-time
/// passa dal gateway WebSocket
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, chat_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    debug!("Appending message via REST");
    body.validate()?;

    let chat = state
        .chat
        .find_for_participant(&chat_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;
    let recipient_id = chat.other_participant(current_user.user_id);

    let message = state
        .msg
        .append(&chat_id, &current_user.user_id, &body.content)
        .await?;

    state
        .chat
        .touch_last_message(
            &chat_id,
            &truncate_chars(&body.content, LAST_MESSAGE_PREVIEW_CHARS),
            &current_user.user_id,
            &message.created_at,
        )
        .await?;
    state.chat.increment_unread(&chat_id, &recipient_id).await?;

    let reads = state
        .msg
        .reads_for_message(&message.message_id)
        .await?
        .into_iter()
        .map(ReadReceiptDTO::from)
        .collect();

    info!(message_id = message.message_id, "Message appended");
    Ok((StatusCode::CREATED, Json(MessageDTO::new(message, reads))))
}

/// Marca come letti i messaggi indicati (o tutti i non letti) e azzera
/// il contatore del chiamante. Idempotente sull'insieme delle ricevute.
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, chat_id))]
pub async fn mark_messages_read(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    Extension(current_user): Extension<User>,
    Json(body): Json<MarkReadDTO>,
) -> Result<StatusCode, AppError> {
    debug!("Marking messages as read");
    state
        .chat
        .find_for_participant(&chat_id, &current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Chat not found"))?;

    let ids = match body.message_ids {
        Some(ids) => ids,
        None => {
            state
                .msg
                .find_unread_ids(&chat_id, &current_user.user_id)
                .await?
        }
    };

    state
        .msg
        .mark_read(&chat_id, &current_user.user_id, &ids)
        .await?;
    state
        .chat
        .reset_unread(&chat_id, &current_user.user_id)
        .await?;

    info!(marked = ids.len(), "Messages marked as read");
    Ok(StatusCode::NO_CONTENT)
}

/// Soft delete: solo il mittente originale può cancellare; il contenuto
/// diventa il tombstone, la riga resta
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id, message_id))]
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    debug!("Soft deleting message");
    let deleted = state
        .msg
        .soft_delete(&message_id, &current_user.user_id)
        .await?;

    if !deleted {
        warn!("Delete rejected, message missing or requester is not the sender");
        return Err(AppError::not_found(
            "Message not found or you do not have permission to delete it",
        ));
    }

    info!("Message deleted");
    Ok(StatusCode::NO_CONTENT)
}
