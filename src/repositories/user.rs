//! UserRepository - Repository per utenti, presenza persistita e chat link

use crate::entities::User;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};

const USER_COLUMNS: &str = "user_id, username, is_online, last_seen, \
     chat_link_code, chat_link_expires_at, created_at";

pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn create(&self, username: &str) -> Result<User, Error> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, is_online, last_seen, created_at) VALUES (?, 0, ?, ?)",
        )
        .bind(username)
        .bind(now)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        Ok(User {
            user_id: result.last_insert_rowid(),
            username: username.to_string(),
            is_online: false,
            last_seen: now,
            chat_link_code: None,
            chat_link_expires_at: None,
            created_at: now,
        })
    }

    pub async fn find_by_id(&self, user_id: &i64) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Lookup O(1) del proprietario di un codice di invito.
    /// Non filtra sulla scadenza: la distinzione Expired/NotFound
    /// è responsabilità del service.
    pub async fn find_by_chat_link_code(&self, code: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE chat_link_code = ?"
        ))
        .bind(code)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Sovrascrive il chat link corrente: il codice precedente è
    /// implicitamente invalidato, nessuna revocation list necessaria
    pub async fn set_chat_link(
        &self,
        user_id: &i64,
        code: &str,
        expires_at: &DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE users SET chat_link_code = ?, chat_link_expires_at = ? WHERE user_id = ?")
            .bind(code)
            .bind(expires_at)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }

    pub async fn clear_chat_link(&self, user_id: &i64) -> Result<(), Error> {
        sqlx::query("UPDATE users SET chat_link_code = NULL, chat_link_expires_at = NULL WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }

    /// Snapshot persistito della presenza; scritto fire-and-forget dal
    /// gateway, mai dal registry stesso
    pub async fn set_presence(
        &self,
        user_id: &i64,
        is_online: bool,
        last_seen: &DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE users SET is_online = ?, last_seen = ? WHERE user_id = ?")
            .bind(is_online)
            .bind(last_seen)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}
