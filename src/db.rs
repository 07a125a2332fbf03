//! Database bootstrap - Schema embedded, applicato all'avvio
//!
//! Lo schema è idempotente (CREATE TABLE IF NOT EXISTS) così lo stesso
//! codice inizializza sia il database di produzione sia i database
//! in-memory usati nei test.

use sqlx::SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    username                TEXT NOT NULL UNIQUE,
    is_online               INTEGER NOT NULL DEFAULT 0,
    last_seen               TEXT NOT NULL,
    chat_link_code          TEXT,
    chat_link_expires_at    TEXT,
    created_at              TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_chat_link_code
    ON users (chat_link_code);

CREATE TABLE IF NOT EXISTS chats (
    chat_id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    user_low                INTEGER NOT NULL REFERENCES users (user_id),
    user_high               INTEGER NOT NULL REFERENCES users (user_id),
    last_message_content    TEXT,
    last_message_sender_id  INTEGER,
    last_message_at         TEXT,
    is_active               INTEGER NOT NULL DEFAULT 1,
    created_at              TEXT NOT NULL,
    updated_at              TEXT NOT NULL
);

-- Al massimo una chat attiva per coppia non ordinata di utenti.
-- Le chat disattivate restano nello storico e non bloccano nuove chat.
CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_active_pair
    ON chats (user_low, user_high) WHERE is_active = 1;

CREATE TABLE IF NOT EXISTS unread_counts (
    chat_id     INTEGER NOT NULL REFERENCES chats (chat_id),
    user_id     INTEGER NOT NULL REFERENCES users (user_id),
    count       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (chat_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    message_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id     INTEGER NOT NULL REFERENCES chats (chat_id),
    sender_id   INTEGER NOT NULL REFERENCES users (user_id),
    content     TEXT NOT NULL,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_created
    ON messages (chat_id, created_at);

CREATE TABLE IF NOT EXISTS message_reads (
    message_id  INTEGER NOT NULL REFERENCES messages (message_id),
    user_id     INTEGER NOT NULL REFERENCES users (user_id),
    read_at     TEXT NOT NULL,
    PRIMARY KEY (message_id, user_id)
);
"#;

/// Applica lo schema al pool fornito
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
