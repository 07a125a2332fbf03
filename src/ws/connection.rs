//! WebSocket Connection Management - Gestione connessioni WebSocket
//!
//! Ciclo di vita per connessione: Connecting -> Authenticating (middleware)
//! -> Connected -> Disconnected. Ogni connessione ha due task: uno di
//! lettura (eventi inbound) e uno di scrittura (canale interno -> socket).

use crate::ws::event_handlers::dispatch;
use crate::ws::presence::ConnSignal;
use crate::{
    AppState,
    dtos::{ClientEvent, ServerEvent},
    entities::User,
};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use chrono::Utc;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state, user), fields(user_id = %user.user_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user: User) {
    info!("WebSocket connection established");
    let user_id = user.user_id;

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale unbounded per la comunicazione interna verso il task di scrittura
    let (int_tx, int_rx) = unbounded_channel::<ConnSignal>();

    let conn_id = open_connection(&state, user_id, int_tx.clone());

    tokio::spawn(write_ws(user_id, ws_tx, int_rx));
    tokio::spawn(listen_ws(user, conn_id, ws_rx, int_tx, state));
}

/// Effetti di apertura connessione: registrazione in presenza con chiusura
/// forzata dell'eventuale connessione soppiantata, annuncio user:online e
/// snapshot persistito (fire-and-forget, mai bloccante per il socket).
/// Ritorna il conn_id assegnato.
#[instrument(skip(state, tx), fields(user_id))]
pub fn open_connection(
    state: &Arc<AppState>,
    user_id: i64,
    tx: UnboundedSender<ConnSignal>,
) -> u64 {
    let (conn_id, superseded) = state.presence.register(user_id, tx);
    if let Some(old) = superseded {
        // last-connection-wins: la connessione soppiantata viene chiusa
        // forzatamente, non lasciata mezza viva ad aspettare eventi
        info!(old_conn_id = old.conn_id, "Forcing shutdown of superseded connection");
        let _ = old.tx.send(ConnSignal::Shutdown);
    }

    state
        .presence
        .broadcast_except(&user_id, &ServerEvent::UserOnline { user_id });
    {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = state.user.set_presence(&user_id, true, &Utc::now()).await {
                warn!(user_id, "Failed to persist online status: {:?}", e);
            }
        });
    }

    conn_id
}

/// Effetti di chiusura connessione: uscita da tutte le stanze della
/// connessione e unregister guardato dal conn_id. Solo se questa era
/// ancora la connessione corrente viene annunciato user:offline e
/// persistito lo snapshot; il teardown tardivo di una connessione già
/// rimpiazzata non tocca né il registro né lo stato persistito.
#[instrument(skip(state, joined), fields(user_id, conn_id))]
pub fn close_connection(
    state: &Arc<AppState>,
    user_id: i64,
    conn_id: u64,
    joined: &mut HashSet<i64>,
) {
    for chat_id in joined.drain() {
        state.rooms.leave(chat_id, user_id);
    }

    if state.presence.unregister(user_id, conn_id) {
        let last_seen = Utc::now();
        state
            .presence
            .broadcast_except(&user_id, &ServerEvent::UserOffline { user_id, last_seen });
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = state.user.set_presence(&user_id, false, &last_seen).await {
                warn!(user_id, "Failed to persist offline status: {:?}", e);
            }
        });
    }
}

/// Task di scrittura: serializza gli eventi dal canale interno verso il
/// socket, finché non arriva uno Shutdown o il canale si chiude
#[instrument(skip(websocket_tx, internal_rx), fields(user_id))]
pub async fn write_ws(
    user_id: i64,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<ConnSignal>,
) {
    info!("Write task started");

    loop {
        match internal_rx.recv().await {
            Some(ConnSignal::Event(event)) => {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize event: {:?}", e);
                        continue;
                    }
                };
                if let Err(e) = websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await {
                    warn!("Failed to send event, closing write task: {:?}", e);
                    break;
                }
            }
            Some(ConnSignal::Shutdown) => {
                info!("Shutdown signal received");
                let _ = websocket_tx.send(Message::Close(None)).await;
                break;
            }
            None => {
                info!("Internal channel closed");
                break;
            }
        }
    }

    info!("Write task terminated");
}

/// Task di lettura: deserializza gli eventi inbound e li smista.
/// Un frame malformato viene loggato e scartato, mai propagato come
/// errore di altre connessioni.
#[instrument(skip(user, websocket_rx, internal_tx, state), fields(user_id = %user.user_id))]
pub async fn listen_ws(
    user: User,
    conn_id: u64,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<ConnSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");
    let user_id = user.user_id;

    // Stanze a cui questa connessione è iscritta; posseduto dal task,
    // nessun lock necessario
    let mut joined: HashSet<i64> = HashSet::new();

    while let Some(msg_result) = websocket_rx.next().await {
        let msg = match msg_result {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket error: {:?}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                if let Ok(event) = serde_json::from_str::<ClientEvent>(&text) {
                    dispatch(&state, &user, &mut joined, event).await;
                } else {
                    warn!("Failed to deserialize client event");
                }
            }
            Message::Close(_) => {
                info!("Close message received");
                break;
            }
            _ => {}
        }
    }

    // Cleanup
    info!("Cleaning up connection");
    let _ = internal_tx.send(ConnSignal::Shutdown);
    close_connection(&state, user_id, conn_id, &mut joined);

    info!("Listen task terminated");
}
