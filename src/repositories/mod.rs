//! Repositories module - Accesso ai dati persistiti
//!
//! Ogni repository incapsula le query SQL per una specifica entità e
//! possiede un clone del pool di connessioni SQLite. Le query usano
//! l'API runtime di sqlx con entità `FromRow`; i nomi delle colonne
//! selezionate coincidono con i campi delle struct.

pub mod chat;
pub mod message;
pub mod user;

// Re-esportazione delle struct dei repository per facilitare l'import
pub use chat::ChatRepository;
pub use message::MessageRepository;
pub use user::UserRepository;
