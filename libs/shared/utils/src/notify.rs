use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use shared_models::error::AppError;

pub type ToastSender = broadcast::Sender<Toast>;
pub type ToastReceiver = broadcast::Receiver<Toast>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct NotificationCenter {
    sender: ToastSender,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> ToastReceiver {
        self.sender.subscribe()
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastLevel::Success, title.into(), message.into());
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastLevel::Info, title.into(), message.into());
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) {
        self.push(ToastLevel::Error, title.into(), message.into());
    }

    pub fn failure(&self, title: impl Into<String>, err: &AppError) {
        warn!("{}", err);
        self.push(ToastLevel::Error, title.into(), err.user_message());
    }

    fn push(&self, level: ToastLevel, title: String, message: String) {
        let toast = Toast {
            level,
            title,
            message,
            at: Utc::now(),
        };
        // Nobody listening is fine: toasts are fire-and-forget.
        if self.sender.send(toast).is_err() {
            debug!("Toast dropped, no subscribers");
        }
    }
}
