pub mod chat;
pub mod list;

pub use chat::{ChatService, MAX_MESSAGE_LEN};
pub use list::ChatSessionList;
