pub mod format;
pub mod jwt;
pub mod listing;
pub mod notify;
pub mod session;
pub mod test_utils;
pub mod validation;

pub use notify::{NotificationCenter, Toast, ToastLevel};
pub use session::{FileSessionStore, MemorySessionStore, SessionProvider};
