//! ChatRepository - Repository per le conversazioni e i contatori non letti

use crate::entities::{Chat, chat::sorted_pair};
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};

const CHAT_COLUMNS: &str = "chat_id, user_low, user_high, last_message_content, \
     last_message_sender_id, last_message_at, is_active, created_at, updated_at";

pub struct ChatRepository {
    connection_pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn read(&self, chat_id: &i64) -> Result<Option<Chat>, Error> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE chat_id = ?"
        ))
        .bind(chat_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(chat)
    }

    /// Chat attiva per la coppia non ordinata {a, b}, se esiste
    pub async fn find_active_pair(&self, a: i64, b: i64) -> Result<Option<Chat>, Error> {
        let (low, high) = sorted_pair(a, b);
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE user_low = ? AND user_high = ? AND is_active = 1"
        ))
        .bind(low)
        .bind(high)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(chat)
    }

    /// Lookup-or-create per coppia non ordinata. L'indice univoco parziale
    /// su (user_low, user_high) trasforma il duplicato da race in un
    /// conflitto, risolto rileggendo la riga vincente.
    pub async fn get_or_create(&self, a: i64, b: i64) -> Result<Chat, Error> {
        if let Some(chat) = self.find_active_pair(a, b).await? {
            return Ok(chat);
        }

        match self.create_pair(a, b).await {
            Ok(chat) => Ok(chat),
            Err(e) if is_unique_violation(&e) => self
                .find_active_pair(a, b)
                .await?
                .ok_or(Error::RowNotFound),
            Err(e) => Err(e),
        }
    }

    async fn create_pair(&self, a: i64, b: i64) -> Result<Chat, Error> {
        let (low, high) = sorted_pair(a, b);
        let now = Utc::now();

        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO chats (user_low, user_high, is_active, created_at, updated_at) \
             VALUES (?, ?, 1, ?, ?)",
        )
        .bind(low)
        .bind(high)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let chat_id = result.last_insert_rowid();

        // Contatori azzerati per entrambi i partecipanti, nella stessa
        // transazione della chat
        for user_id in [low, high] {
            sqlx::query("INSERT INTO unread_counts (chat_id, user_id, count) VALUES (?, ?, 0)")
                .bind(chat_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(Chat {
            chat_id,
            user_low: low,
            user_high: high,
            last_message_content: None,
            last_message_sender_id: None,
            last_message_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Chat attiva di cui `user_id` è partecipante; None anche quando la
    /// chat esiste ma il chiamante non ne fa parte (mai rivelarne l'esistenza)
    pub async fn find_for_participant(
        &self,
        chat_id: &i64,
        user_id: &i64,
    ) -> Result<Option<Chat>, Error> {
        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats \
             WHERE chat_id = ? AND is_active = 1 AND (user_low = ? OR user_high = ?)"
        ))
        .bind(chat_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(chat)
    }

    /// Chat attive dell'utente, ordinate per attività più recente
    pub async fn list_for_user(&self, user_id: &i64) -> Result<Vec<Chat>, Error> {
        let chats = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats \
             WHERE (user_low = ? OR user_high = ?) AND is_active = 1 \
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(chats)
    }

    /// Aggiorna la cache denormalizzata dell'ultimo messaggio. Best-effort:
    /// il ledger resta l'unica fonte di verità per il contenuto.
    pub async fn touch_last_message(
        &self,
        chat_id: &i64,
        preview: &str,
        sender_id: &i64,
        timestamp: &DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            "UPDATE chats SET last_message_content = ?, last_message_sender_id = ?, \
             last_message_at = ?, updated_at = ? WHERE chat_id = ?",
        )
        .bind(preview)
        .bind(sender_id)
        .bind(timestamp)
        .bind(timestamp)
        .bind(chat_id)
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    /// Incremento atomico lato storage: due increment concorrenti per lo
    /// stesso destinatario non possono perdersi a vicenda
    pub async fn increment_unread(&self, chat_id: &i64, user_id: &i64) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO unread_counts (chat_id, user_id, count) VALUES (?, ?, 1) \
             ON CONFLICT (chat_id, user_id) DO UPDATE SET count = count + 1",
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    /// Azzera il contatore; idempotente, azzerare un contatore già a zero
    /// è un no-op
    pub async fn reset_unread(&self, chat_id: &i64, user_id: &i64) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO unread_counts (chat_id, user_id, count) VALUES (?, ?, 0) \
             ON CONFLICT (chat_id, user_id) DO UPDATE SET count = 0",
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    pub async fn unread_count(&self, chat_id: &i64, user_id: &i64) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count FROM unread_counts WHERE chat_id = ? AND user_id = ?",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    /// Soft delete: la chat resta nello storico ma esce da tutte le liste
    /// e dal vincolo di unicità sulla coppia
    pub async fn deactivate(&self, chat_id: &i64) -> Result<(), Error> {
        sqlx::query("UPDATE chats SET is_active = 0, updated_at = ? WHERE chat_id = ?")
            .bind(Utc::now())
            .bind(chat_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}

fn is_unique_violation(e: &Error) -> bool {
    matches!(e, Error::Database(db) if db.is_unique_violation())
}
