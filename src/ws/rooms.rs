//! Room Map - Membership effimera delle stanze
//!
//! Una stanza corrisponde a una conversazione: contiene gli utenti che la
//! stanno guardando in questo momento. La membership decide tra fanout
//! completo (message:receive) e notifica leggera (message:notification).

use dashmap::DashMap;
use std::collections::HashSet;
use tracing::{info, instrument};

pub struct RoomMap {
    rooms: DashMap<i64, HashSet<i64>>,
}

impl RoomMap {
    pub fn new() -> Self {
        RoomMap {
            rooms: DashMap::new(),
        }
    }

    /// Aggiunge l'utente alla stanza; idempotente
    #[instrument(skip(self), fields(chat_id, user_id))]
    pub fn join(&self, chat_id: i64, user_id: i64) {
        self.rooms.entry(chat_id).or_default().insert(user_id);
        info!("User joined room");
    }

    /// Rimuove l'utente dalla stanza; idempotente. Le stanze vuote
    /// vengono eliminate dalla mappa.
    #[instrument(skip(self), fields(chat_id, user_id))]
    pub fn leave(&self, chat_id: i64, user_id: i64) {
        if let Some(mut members) = self.rooms.get_mut(&chat_id) {
            members.remove(&user_id);
            let empty = members.is_empty();
            drop(members); // rilascia il lock prima della remove
            if empty {
                self.rooms.remove_if(&chat_id, |_, m| m.is_empty());
            }
        }
        info!("User left room");
    }

    pub fn contains(&self, chat_id: &i64, user_id: &i64) -> bool {
        self.rooms
            .get(chat_id)
            .map(|members| members.contains(user_id))
            .unwrap_or(false)
    }

    /// Snapshot dei membri correnti della stanza
    pub fn members(&self, chat_id: &i64) -> Vec<i64> {
        self.rooms
            .get(chat_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl Default for RoomMap {
    fn default() -> Self {
        Self::new()
    }
}
