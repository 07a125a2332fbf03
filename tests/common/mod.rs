#![allow(dead_code)]

use axum_test::TestServer;
use novachat_server::core::AppState;
use novachat_server::db;
use novachat_server::entities::User;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

/// Pool SQLite in-memory con lo schema applicato.
/// Una sola connessione: più connessioni vedrebbero database diversi.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::init_schema(&pool)
        .await
        .expect("Failed to apply schema");
    pool
}

/// Crea un AppState per i test (TTL chat link: 60 minuti)
pub async fn create_test_state() -> Arc<AppState> {
    let pool = create_test_pool().await;
    Arc::new(AppState::new(pool, TEST_JWT_SECRET.to_string(), 60))
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = novachat_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token valido 24 ore per l'utente indicato
pub fn create_test_jwt(user_id: i64, username: &str) -> String {
    novachat_server::core::encode_jwt(username.to_string(), user_id, &TEST_JWT_SECRET.to_string())
        .expect("Failed to create JWT token")
}

/// Inserisce un utente di test e ritorna la riga creata
pub async fn seed_user(state: &AppState, username: &str) -> User {
    state
        .user
        .create(username)
        .await
        .expect("Failed to create user")
}
