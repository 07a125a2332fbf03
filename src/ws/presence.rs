//! Presence Registry - Registro autorevole degli utenti connessi
//!
//! Unico punto di coordinamento per la presenza: mai una hashmap condivisa
//! mutata da più call site. Il gateway è il solo chiamante di
//! register/unregister; tutti gli altri usano solo lookup e invio.

use crate::dtos::ServerEvent;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

/// Segnali interni verso il task di scrittura di una connessione
#[derive(Debug)]
pub enum ConnSignal {
    /// Evento da serializzare e inviare al client
    Event(ServerEvent),
    /// Chiusura ordinata: disconnessione o connessione soppiantata
    Shutdown,
}

/// Handle di una connessione registrata: l'id serve a distinguere la
/// connessione corrente da una già rimpiazzata
pub struct ConnHandle {
    pub conn_id: u64,
    pub tx: UnboundedSender<ConnSignal>,
}

pub struct PresenceRegistry {
    online: DashMap<i64, ConnHandle>,
    next_conn_id: AtomicU64,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        PresenceRegistry {
            online: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Registra la connessione per `user_id` con semantica
    /// last-connection-wins. Ritorna il conn_id assegnato e l'eventuale
    /// handle soppiantato, che il gateway deve chiudere forzatamente.
    #[instrument(skip(self, tx), fields(user_id))]
    pub fn register(&self, user_id: i64, tx: UnboundedSender<ConnSignal>) -> (u64, Option<ConnHandle>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let superseded = self.online.insert(user_id, ConnHandle { conn_id, tx });
        info!(conn_id, total_online = self.online.len(), "User registered as online");
        (conn_id, superseded)
    }

    /// Rimuove la connessione solo se `conn_id` è ancora quella corrente:
    /// il teardown fuori ordine di una connessione già rimpiazzata non
    /// deve spodestare quella nuova. Ritorna true se ha rimosso.
    #[instrument(skip(self), fields(user_id, conn_id))]
    pub fn unregister(&self, user_id: i64, conn_id: u64) -> bool {
        let removed = self
            .online
            .remove_if(&user_id, |_, handle| handle.conn_id == conn_id)
            .is_some();
        if removed {
            info!("User removed from online registry");
        } else {
            info!("Stale unregister ignored, connection already replaced");
        }
        removed
    }

    /// Invia un evento se l'utente è connesso. Ritorna true se l'evento è
    /// stato accodato sul canale della connessione.
    #[instrument(skip(self, event), fields(user_id))]
    pub fn send_if_online(&self, user_id: &i64, event: ServerEvent) -> bool {
        if let Some(entry) = self.online.get(user_id) {
            if let Err(e) = entry.tx.send(ConnSignal::Event(event)) {
                warn!("Failed to send event to user: {:?}", e);
                false
            } else {
                true
            }
        } else {
            false
        }
    }

    /// Broadcast di presenza a tutti gli utenti connessi tranne `user_id`
    #[instrument(skip(self, event), fields(user_id))]
    pub fn broadcast_except(&self, user_id: &i64, event: &ServerEvent) {
        let mut sent = 0usize;
        for entry in self.online.iter() {
            if entry.key() == user_id {
                continue;
            }
            if entry.value().tx.send(ConnSignal::Event(event.clone())).is_ok() {
                sent += 1;
            }
        }
        info!(receivers = sent, "Presence event broadcast");
    }

    pub fn is_online(&self, user_id: &i64) -> bool {
        self.online.contains_key(user_id)
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
