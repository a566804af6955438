use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use shared_models::error::AppError;
use shared_polling::{Fetch, PollPhase, PollableResource, PollerStats, PollerStatsSnapshot, ResourceState};
use shared_utils::NotificationCenter;

use crate::error::QueueError;
use crate::models::{CallNextOutcome, CompleteConsultationRequest, QueueEntry, QueueSnapshot, QueueStatus, SkipPatientRequest};
use crate::services::queue::QueueService;

/// Blocking dialogs on the queue page. While one is open the board stops refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDialog {
    CompleteConsultation,
    SkipPatient,
    PatientDetail,
}

struct SnapshotFetch {
    service: Arc<QueueService>,
    notifier: NotificationCenter,
}

#[async_trait]
impl Fetch<QueueSnapshot> for SnapshotFetch {
    async fn fetch(&self) -> Result<QueueSnapshot, AppError> {
        match futures::try_join!(self.service.today(), self.service.waiting()) {
            Ok((today, waiting)) => Ok(QueueSnapshot { today, waiting }),
            Err(err) => {
                self.notifier.failure("Failed to load queue", &err);
                Err(err)
            }
        }
    }
}

/// The doctor's queue page: today's overview kept fresh on a timer, paused while a
/// dialog is open.
pub struct QueueBoard {
    service: Arc<QueueService>,
    notifier: NotificationCenter,
    resource: PollableResource<QueueSnapshot>,
    dialog: Mutex<Option<QueueDialog>>,
}

impl QueueBoard {
    /// Loads immediately, then every `interval`.
    pub fn mount(service: Arc<QueueService>, notifier: NotificationCenter, interval: Duration) -> Self {
        let fetcher = Arc::new(SnapshotFetch {
            service: service.clone(),
            notifier: notifier.clone(),
        });
        let resource = PollableResource::start("queue", fetcher, interval);
        info!("Queue board mounted, refreshing every {:?}", interval);

        Self {
            service,
            notifier,
            resource,
            dialog: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<QueueSnapshot>> {
        self.resource.subscribe()
    }

    pub fn state(&self) -> ResourceState<QueueSnapshot> {
        self.resource.snapshot()
    }

    pub fn phase(&self) -> PollPhase {
        self.resource.phase()
    }

    pub fn stats(&self) -> PollerStatsSnapshot {
        self.resource.stats()
    }

    pub fn stats_handle(&self) -> Arc<PollerStats> {
        self.resource.stats_handle()
    }

    pub async fn dialog(&self) -> Option<QueueDialog> {
        *self.dialog.lock().await
    }

    /// Opens a blocking dialog and cancels the pending refresh.
    ///
    /// Re-opening the dialog that is already open is a no-op; a different one is refused.
    pub async fn open_dialog(&self, dialog: QueueDialog) -> Result<(), QueueError> {
        let mut open = self.dialog.lock().await;
        match *open {
            Some(current) if current == dialog => Ok(()),
            Some(current) => Err(QueueError::DialogBusy {
                open: current,
                requested: dialog,
            }),
            None => {
                debug!("Opening {:?}, suspending refresh", dialog);
                *open = Some(dialog);
                self.resource.suspend().await;
                Ok(())
            }
        }
    }

    /// Closes the open dialog: one quiet fetch now, then the regular cadence.
    pub async fn close_dialog(&self) {
        let mut open = self.dialog.lock().await;
        if let Some(dialog) = open.take() {
            debug!("Closed {:?}, resuming refresh", dialog);
            self.resource.resume().await;
        }
    }

    /// Manual "Refresh" button. Returns `false` if it was dropped.
    pub async fn refresh(&self) -> bool {
        self.resource.refresh().await
    }

    pub async fn call_next(&self) -> Result<CallNextOutcome, QueueError> {
        match self.service.call_next().await {
            Ok(CallNextOutcome::Called(entry)) => {
                self.notifier.success(
                    "Patient called",
                    format!("{} {} is now in consultation", entry.queue_number, entry.patient.name),
                );
                self.request_refresh().await;
                Ok(CallNextOutcome::Called(entry))
            }
            Ok(CallNextOutcome::NoPatientWaiting) => {
                self.notifier.info("Queue empty", "No patient is waiting");
                Ok(CallNextOutcome::NoPatientWaiting)
            }
            Err(err) => {
                self.notifier.failure("Failed to call next patient", &err);
                Err(err.into())
            }
        }
    }

    pub async fn skip(&self, queue_id: &str, reason: Option<String>) -> Result<Option<QueueEntry>, QueueError> {
        if let Some(entry) = self.rendered_entry(queue_id) {
            if !entry.status.can_transition_to(&QueueStatus::Cancelled) {
                let err = QueueError::InvalidStatusTransition {
                    from: entry.status,
                    to: QueueStatus::Cancelled,
                };
                self.notifier.error("Cannot skip patient", err.user_message());
                return Err(err);
            }
        }

        let request = SkipPatientRequest {
            queue_id: queue_id.to_string(),
            reason,
        };
        match self.service.skip(&request).await {
            Ok(skipped) => {
                self.notifier.success("Patient skipped", format!("Queue entry {} skipped", queue_id));
                self.request_refresh().await;
                Ok(skipped)
            }
            Err(err) => {
                self.notifier.failure("Failed to skip patient", &err);
                Err(err.into())
            }
        }
    }

    /// Submits the complete-consultation form. On success the dialog closes, which
    /// resumes refreshing; on failure it stays open with the form intact.
    pub async fn complete_consultation(
        &self,
        request: CompleteConsultationRequest,
    ) -> Result<Option<QueueEntry>, QueueError> {
        let in_progress = {
            let state = self.resource.snapshot();
            state.data.as_ref().and_then(|s| s.current().cloned())
        };
        if matches!(&in_progress, Some(current) if current.id != request.queue_id) {
            warn!("Completing {} while another entry is rendered as current", request.queue_id);
        }

        match self.service.complete(&request).await {
            Ok(entry) => {
                self.notifier.success("Consultation completed", "The patient has been checked out");
                if self.dialog().await.is_some() {
                    self.close_dialog().await;
                } else {
                    self.request_refresh().await;
                }
                Ok(entry)
            }
            Err(err) => {
                self.notifier.failure("Failed to complete consultation", &err);
                Err(err.into())
            }
        }
    }

    pub async fn unmount(self) {
        self.resource.unmount().await;
        info!("Queue board unmounted");
    }

    fn rendered_entry(&self, queue_id: &str) -> Option<QueueEntry> {
        let state = self.resource.snapshot();
        let snapshot = state.data?;
        snapshot
            .waiting
            .iter()
            .chain(snapshot.today.current.iter())
            .chain(snapshot.today.completed.iter())
            .find(|e| e.id == queue_id)
            .cloned()
    }

    async fn request_refresh(&self) {
        self.resource.invalidate().await;
    }
}
