//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod chat;
pub mod chat_link;
pub mod message;
pub mod query;
pub mod user;
pub mod ws_event;

// Re-exports per mantenere gli import compatti
pub use chat::{ChatSummaryDTO, CreateChatDTO, LastMessageDTO};
pub use chat_link::{ChatLinkDTO, ChatLinkValidationDTO};
pub use message::{
    CreateMessageDTO, MarkReadDTO, MessageDTO, MessagesPageDTO, PaginationDTO, ReadReceiptDTO,
};
pub use query::MessagesQuery;
pub use user::UserDTO;
pub use ws_event::{ClientEvent, ServerEvent};
