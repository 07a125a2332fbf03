//! MessageRepository - Repository per il ledger dei messaggi e le ricevute di lettura

use crate::entities::{Message, ReadReceipt, message::TOMBSTONE};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const MESSAGE_COLUMNS: &str = "message_id, chat_id, sender_id, content, is_deleted, created_at";

pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Append sul ledger. La ricevuta di lettura del mittente viene
    /// inizializzata nella stessa transazione: chi invia ha implicitamente
    /// letto il proprio messaggio.
    pub async fn append(
        &self,
        chat_id: &i64,
        sender_id: &i64,
        content: &str,
    ) -> Result<Message, Error> {
        let now = Utc::now();

        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO messages (chat_id, sender_id, content, is_deleted, created_at) \
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(chat_id)
        .bind(sender_id)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let message_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO message_reads (message_id, user_id, read_at) VALUES (?, ?, ?)")
            .bind(message_id)
            .bind(sender_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Message {
            message_id,
            chat_id: *chat_id,
            sender_id: *sender_id,
            content: content.to_string(),
            is_deleted: false,
            created_at: now,
        })
    }

    pub async fn read(&self, message_id: &i64) -> Result<Option<Message>, Error> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?"
        ))
        .bind(message_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(message)
    }

    /// Pagina di messaggi: calcolata dal più recente al più vecchio e poi
    /// invertita, così la pagina 1 contiene sempre gli ultimi `limit`
    /// messaggi in ordine di visualizzazione (vecchio -> nuovo).
    /// I messaggi cancellati restano in pagina col contenuto tombstone.
    pub async fn page(&self, chat_id: &i64, page: i64, limit: i64) -> Result<Vec<Message>, Error> {
        let page = page.max(1);
        let offset = (page - 1) * limit;

        // message_id come tie-break: timestamp uguali non devono poter
        // duplicare o perdere righe tra pagine adiacenti
        let mut messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ? \
             ORDER BY created_at DESC, message_id DESC LIMIT ? OFFSET ?"
        ))
        .bind(chat_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.connection_pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    pub async fn count_for_chat(&self, chat_id: &i64) -> Result<i64, Error> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_one(&self.connection_pool)
                .await?;

        Ok(count)
    }

    /// Id dei messaggi della chat non ancora letti da `user_id`
    /// (i propri messaggi non contano mai come non letti)
    pub async fn find_unread_ids(&self, chat_id: &i64, user_id: &i64) -> Result<Vec<i64>, Error> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT message_id FROM messages \
             WHERE chat_id = ? AND sender_id != ? \
               AND message_id NOT IN \
                   (SELECT message_id FROM message_reads WHERE user_id = ?) \
             ORDER BY message_id",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }

    /// Aggiunge le ricevute di lettura mancanti. Idempotente: una ricevuta
    /// già presente non viene duplicata né aggiornata. La subquery sulla
    /// chat impedisce di marcare messaggi di altre conversazioni.
    pub async fn mark_read(
        &self,
        chat_id: &i64,
        user_id: &i64,
        message_ids: &[i64],
    ) -> Result<(), Error> {
        let now = Utc::now();

        let mut tx = self.connection_pool.begin().await?;

        for message_id in message_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO message_reads (message_id, user_id, read_at) \
                 SELECT message_id, ?, ? FROM messages WHERE message_id = ? AND chat_id = ?",
            )
            .bind(user_id)
            .bind(now)
            .bind(message_id)
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Tutte le ricevute di lettura della chat; il chiamante le raggruppa
    /// per messaggio in memoria
    pub async fn reads_for_chat(&self, chat_id: &i64) -> Result<Vec<ReadReceipt>, Error> {
        let reads = sqlx::query_as::<_, ReadReceipt>(
            "SELECT r.message_id, r.user_id, r.read_at FROM message_reads r \
             JOIN messages m ON m.message_id = r.message_id \
             WHERE m.chat_id = ? ORDER BY r.message_id",
        )
        .bind(chat_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(reads)
    }

    pub async fn reads_for_message(&self, message_id: &i64) -> Result<Vec<ReadReceipt>, Error> {
        let reads = sqlx::query_as::<_, ReadReceipt>(
            "SELECT message_id, user_id, read_at FROM message_reads WHERE message_id = ?",
        )
        .bind(message_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(reads)
    }

    /// Soft delete: solo il mittente originale. Il contenuto diventa il
    /// tombstone, id/mittente/timestamp restano intatti.
    ///
    /// Ritorna false se il messaggio non esiste o il richiedente non è
    /// il mittente.
    pub async fn soft_delete(&self, message_id: &i64, requester_id: &i64) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE messages SET content = ?, is_deleted = 1 \
             WHERE message_id = ? AND sender_id = ?",
        )
        .bind(TOMBSTONE)
        .bind(message_id)
        .bind(requester_id)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
