//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod chat;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use chat::Chat;
pub use message::{Message, ReadReceipt};
pub use user::{ChatLink, User};
