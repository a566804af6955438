use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use shared_models::error::AppError;
use shared_polling::{Fetch, PollPhase, PollableResource, PollerStatsSnapshot, ResourceState};

use crate::error::LoadFailure;
use crate::models::{ChatSession, ChatSessionsView};
use crate::services::chat::ChatService;

struct SessionsFetch {
    service: Arc<ChatService>,
}

#[async_trait]
impl Fetch<ChatSessionsView> for SessionsFetch {
    async fn fetch(&self) -> Result<ChatSessionsView, AppError> {
        let response = self.service.sessions().await?;
        Ok(ChatSessionsView::from(response))
    }
}

/// Active chat sessions, triage-sorted and refreshed on a timer.
///
/// Mounting checks connectivity first; the list only starts polling once the
/// backend answered. Until then (or after a failed check) it sits in a
/// retryable error state.
pub struct ChatSessionList {
    service: Arc<ChatService>,
    interval: Duration,
    resource: Mutex<Option<PollableResource<ChatSessionsView>>>,
    connect_failure: StdMutex<Option<LoadFailure>>,
    selected: StdMutex<Option<String>>,
    dialog_open: Mutex<bool>,
}

impl ChatSessionList {
    pub async fn mount(service: Arc<ChatService>, interval: Duration) -> Self {
        let list = Self {
            service,
            interval,
            resource: Mutex::new(None),
            connect_failure: StdMutex::new(None),
            selected: StdMutex::new(None),
            dialog_open: Mutex::new(false),
        };
        list.connect().await;
        list
    }

    async fn connect(&self) -> bool {
        // Same lock order as the dialog gate.
        let dialog_open = self.dialog_open.lock().await;
        let mut resource = self.resource.lock().await;
        if resource.is_some() {
            return true;
        }

        match self.service.check_connectivity().await {
            Ok(()) => {
                let fetcher = Arc::new(SessionsFetch {
                    service: self.service.clone(),
                });
                let started = PollableResource::start("chat-sessions", fetcher, self.interval);
                if *dialog_open {
                    debug!("Dialog open while connecting, chat list starts paused");
                    started.suspend().await;
                }
                *resource = Some(started);
                self.set_connect_failure(None);
                info!("Chat session list connected, refreshing every {:?}", self.interval);
                true
            }
            Err(err) => {
                warn!("Chat backend connectivity check failed: {}", err);
                self.set_connect_failure(Some(LoadFailure::from(&err)));
                false
            }
        }
    }

    fn set_connect_failure(&self, failure: Option<LoadFailure>) {
        if let Ok(mut slot) = self.connect_failure.lock() {
            *slot = failure;
        }
    }

    pub async fn is_live(&self) -> bool {
        self.resource.lock().await.is_some()
    }

    pub async fn subscribe(&self) -> Option<watch::Receiver<ResourceState<ChatSessionsView>>> {
        self.resource.lock().await.as_ref().map(PollableResource::subscribe)
    }

    pub async fn state(&self) -> Option<ResourceState<ChatSessionsView>> {
        self.resource.lock().await.as_ref().map(PollableResource::snapshot)
    }

    pub async fn stats(&self) -> Option<PollerStatsSnapshot> {
        self.resource.lock().await.as_ref().map(PollableResource::stats)
    }

    pub async fn phase(&self) -> PollPhase {
        match self.resource.lock().await.as_ref() {
            Some(resource) => resource.phase(),
            None => PollPhase::Stopped,
        }
    }

    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.state()
            .await
            .and_then(|s| s.data)
            .map(|view| view.sessions.clone())
            .unwrap_or_default()
    }

    /// Current error state, if any: a failed connectivity check, or the last fetch failing.
    pub async fn failure(&self) -> Option<LoadFailure> {
        if let Some(failure) = self.connect_failure.lock().ok().and_then(|f| f.clone()) {
            return Some(failure);
        }
        self.state()
            .await
            .and_then(|s| s.error)
            .map(|err| LoadFailure::from(&err))
    }

    /// "Try Again": reconnects if the list never started, otherwise refreshes.
    pub async fn retry(&self) -> bool {
        if !self.is_live().await {
            return self.connect().await;
        }
        match self.resource.lock().await.as_ref() {
            Some(resource) => resource.refresh().await,
            None => false,
        }
    }

    /// Hands a session to the conversation view. Local only: no request is made.
    pub fn select(&self, consultation_id: &str) {
        debug!("Selected chat session {}", consultation_id);
        if let Ok(mut selected) = self.selected.lock() {
            *selected = Some(consultation_id.to_string());
        }
    }

    pub fn selected(&self) -> Option<String> {
        self.selected.lock().ok().and_then(|s| s.clone())
    }

    pub async fn selected_session(&self) -> Option<ChatSession> {
        let id = self.selected()?;
        self.sessions()
            .await
            .into_iter()
            .find(|s| s.consultation_id == id)
    }

    /// Pauses refreshing while a blocking dialog is open, the same way the queue page does.
    pub async fn open_dialog(&self) {
        let mut open = self.dialog_open.lock().await;
        if *open {
            return;
        }
        *open = true;
        if let Some(resource) = self.resource.lock().await.as_ref() {
            resource.suspend().await;
        }
    }

    pub async fn close_dialog(&self) {
        let mut open = self.dialog_open.lock().await;
        if !*open {
            return;
        }
        *open = false;
        if let Some(resource) = self.resource.lock().await.as_ref() {
            resource.resume().await;
        }
    }

    pub async fn unmount(self) {
        if let Some(resource) = self.resource.into_inner() {
            resource.unmount().await;
        }
        info!("Chat session list unmounted");
    }
}
