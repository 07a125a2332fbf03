//! WebSocket Event Handlers - Dispatch tipizzato degli eventi inbound
//!
//! Ogni evento del client è una variante di `ClientEvent` e passa da un
//! singolo match: niente closure condivise sullo stato della connessione.
//! Il fanout avviene inline nel task di lettura, così l'ordine di consegna
//! dentro una stanza coincide con l'ordine di ricezione dal mittente.
//! Le scritture durevoli partono come task staccati e non bloccano mai
//! il loop di lettura.

use crate::AppState;
use crate::dtos::{ClientEvent, ServerEvent, UserDTO};
use crate::entities::User;
use crate::ws::utils::{fanout_to_room, send_error_to_user, truncate_chars};
use crate::ws::{LAST_MESSAGE_PREVIEW_CHARS, MAX_CONTENT_CHARS, NOTIFICATION_PREVIEW_CHARS};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Smista un evento inbound sulla connessione autenticata di `user`.
/// `joined` è l'insieme delle stanze di questa connessione, posseduto dal
/// task di lettura.
#[instrument(skip(state, user, joined, event), fields(user_id = %user.user_id))]
pub async fn dispatch(
    state: &Arc<AppState>,
    user: &User,
    joined: &mut HashSet<i64>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::ChatJoin { chat_id } => handle_join(state, user, joined, chat_id).await,
        ClientEvent::ChatLeave { chat_id } => handle_leave(state, user, joined, chat_id),
        ClientEvent::MessageSend {
            chat_id,
            content,
            recipient_id: _,
            temp_id,
        } => handle_message_send(state, user, chat_id, content, temp_id).await,
        ClientEvent::TypingStart { chat_id } => handle_typing(state, user, joined, chat_id, true),
        ClientEvent::TypingStop { chat_id } => handle_typing(state, user, joined, chat_id, false),
        ClientEvent::MessageRead {
            chat_id,
            message_ids,
        } => handle_message_read(state, user, chat_id, message_ids).await,
    }
}

async fn handle_join(state: &Arc<AppState>, user: &User, joined: &mut HashSet<i64>, chat_id: i64) {
    match state.chat.find_for_participant(&chat_id, &user.user_id).await {
        Ok(Some(_)) => {
            state.rooms.join(chat_id, user.user_id);
            joined.insert(chat_id);
        }
        Ok(None) => {
            warn!(chat_id, "Join rejected, user is not a participant");
            send_error_to_user(state, user.user_id, 404, "Chat not found");
        }
        Err(e) => {
            warn!(chat_id, "Join failed on membership lookup: {:?}", e);
            send_error_to_user(state, user.user_id, 500, "Internal server error");
        }
    }
}

fn handle_leave(state: &Arc<AppState>, user: &User, joined: &mut HashSet<i64>, chat_id: i64) {
    state.rooms.leave(chat_id, user.user_id);
    joined.remove(&chat_id);
}

async fn handle_message_send(
    state: &Arc<AppState>,
    user: &User,
    chat_id: i64,
    content: String,
    temp_id: Option<String>,
) {
    if content.is_empty() || content.chars().count() > MAX_CONTENT_CHARS {
        send_error_to_user(
            state,
            user.user_id,
            400,
            "Message content must be between 1 and 5000 characters",
        );
        return;
    }

    // Unica sospensione prima del fanout: la verifica di membership.
    // Il destinatario autorevole è l'altro partecipante della riga chat,
    // mai il recipient_id dichiarato dal client.
    let chat = match state.chat.find_for_participant(&chat_id, &user.user_id).await {
        Ok(Some(chat)) => chat,
        Ok(None) => {
            warn!(chat_id, "Send rejected, user is not a participant");
            send_error_to_user(state, user.user_id, 404, "Chat not found");
            return;
        }
        Err(e) => {
            warn!(chat_id, "Send failed on membership lookup: {:?}", e);
            send_error_to_user(state, user.user_id, 500, "Internal server error");
            return;
        }
    };
    let recipient_id = chat.other_participant(user.user_id);
    let timestamp = Utc::now();

    // Percorso a bassa latenza: fanout immediato, senza attendere la
    // persistenza
    let receive = ServerEvent::MessageReceive {
        chat_id,
        content: content.clone(),
        sender: UserDTO::from(user),
        timestamp,
        temp_id,
    };
    fanout_to_room(state, chat_id, user.user_id, &receive);

    // Consegna fuori-stanza: destinatario connesso ma non in questa stanza
    if state.presence.is_online(&recipient_id) && !state.rooms.contains(&chat_id, &recipient_id) {
        let notified = state.presence.send_if_online(
            &recipient_id,
            ServerEvent::MessageNotification {
                chat_id,
                sender: UserDTO::from(user),
                preview: truncate_chars(&content, NOTIFICATION_PREVIEW_CHARS),
            },
        );
        info!(recipient_id, notified, "Out-of-room notification");
    }

    // Percorso di durabilità, staccato dal fanout. In caso di errore il
    // messaggio è già stato consegnato live: si avvisa il mittente, non
    // si ripete mai il fanout.
    let state = state.clone();
    let sender_id = user.user_id;
    tokio::spawn(async move {
        if let Err(e) = persist_message(&state, chat_id, sender_id, recipient_id, &content).await {
            warn!(chat_id, sender_id, "Durable write failed after live delivery: {:?}", e);
            send_error_to_user(
                &state,
                sender_id,
                500,
                "Message delivered but may not have been saved",
            );
        }
    });
}

/// Effetti durevoli di un invio: append sul ledger, aggiornamento della
/// cache last_message, incremento del contatore non letti del destinatario
async fn persist_message(
    state: &AppState,
    chat_id: i64,
    sender_id: i64,
    recipient_id: i64,
    content: &str,
) -> Result<(), sqlx::Error> {
    let message = state.msg.append(&chat_id, &sender_id, content).await?;
    state
        .chat
        .touch_last_message(
            &chat_id,
            &truncate_chars(content, LAST_MESSAGE_PREVIEW_CHARS),
            &sender_id,
            &message.created_at,
        )
        .await?;
    state.chat.increment_unread(&chat_id, &recipient_id).await?;
    Ok(())
}

/// Typing: puro fanout effimero, nessuna persistenza, nessun ack.
/// Richiede che il mittente sia nella stanza, così non serve toccare il
/// database a ogni tasto premuto.
fn handle_typing(
    state: &Arc<AppState>,
    user: &User,
    joined: &HashSet<i64>,
    chat_id: i64,
    started: bool,
) {
    if !joined.contains(&chat_id) {
        return;
    }
    let event = if started {
        ServerEvent::TypingStart {
            chat_id,
            user_id: user.user_id,
            username: user.username.clone(),
        }
    } else {
        ServerEvent::TypingStop {
            chat_id,
            user_id: user.user_id,
        }
    };
    fanout_to_room(state, chat_id, user.user_id, &event);
}

async fn handle_message_read(
    state: &Arc<AppState>,
    user: &User,
    chat_id: i64,
    message_ids: Option<Vec<i64>>,
) {
    match state.chat.find_for_participant(&chat_id, &user.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(chat_id, "Read rejected, user is not a participant");
            send_error_to_user(state, user.user_id, 404, "Chat not found");
            return;
        }
        Err(e) => {
            warn!(chat_id, "Read failed on membership lookup: {:?}", e);
            send_error_to_user(state, user.user_id, 500, "Internal server error");
            return;
        }
    }

    // Id omessi = tutti i messaggi non letti del chiamante nella chat
    let resolved_ids = match message_ids {
        Some(ids) => ids,
        None => match state.msg.find_unread_ids(&chat_id, &user.user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(chat_id, "Failed to resolve unread ids: {:?}", e);
                send_error_to_user(state, user.user_id, 500, "Internal server error");
                return;
            }
        },
    };

    fanout_to_room(
        state,
        chat_id,
        user.user_id,
        &ServerEvent::MessageRead {
            chat_id,
            user_id: user.user_id,
            message_ids: resolved_ids.clone(),
        },
    );

    let state = state.clone();
    let user_id = user.user_id;
    tokio::spawn(async move {
        let persisted = async {
            state.msg.mark_read(&chat_id, &user_id, &resolved_ids).await?;
            state.chat.reset_unread(&chat_id, &user_id).await
        }
        .await;
        if let Err(e) = persisted {
            warn!(chat_id, user_id, "Failed to persist read receipts: {:?}", e);
        }
    });
}
