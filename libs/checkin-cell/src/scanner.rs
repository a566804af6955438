use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use queue_cell::{CheckInResult, QueueService, QueueType};
use shared_models::error::{AppError, FailureKind};
use shared_utils::format::format_wait;
use shared_utils::NotificationCenter;

use crate::camera::{Camera, CameraConstraints, StreamGuard};
use crate::decoder::FrameDecoder;
use crate::error::CheckInError;

/// The check-in call a decoded payload is submitted to.
#[async_trait]
pub trait CheckInApi: Send + Sync {
    async fn check_in(&self, code: &str) -> Result<CheckInResult, AppError>;
}

#[async_trait]
impl CheckInApi for QueueService {
    async fn check_in(&self, code: &str) -> Result<CheckInResult, AppError> {
        QueueService::check_in(self, code).await
    }
}

/// What the result panel shows after a successful check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInSummary {
    pub code: String,
    pub queue_number: String,
    pub patient_name: String,
    pub previous_type: QueueType,
    pub queue_type: QueueType,
    pub position: u32,
    pub estimated_wait_minutes: Option<i64>,
}

impl CheckInSummary {
    fn from_result(code: &str, result: &CheckInResult) -> Self {
        Self {
            code: code.to_string(),
            queue_number: result.queue.queue_number.clone(),
            patient_name: result.queue.patient.name.clone(),
            previous_type: result.previous_type,
            queue_type: result.queue_type(),
            position: result.position,
            estimated_wait_minutes: result
                .estimated_wait_minutes
                .or(result.queue.estimated_wait_minutes),
        }
    }

    pub fn estimated_wait_label(&self) -> Option<String> {
        self.estimated_wait_minutes.map(format_wait)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    CheckedIn(CheckInSummary),
    Failed { kind: FailureKind, message: String },
    PermissionDenied(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanPhase {
    Idle,
    /// Camera being opened.
    Starting,
    /// Camera live, decoder polled on every tick.
    Scanning,
    /// Camera released, check-in request in flight.
    Processing { code: String },
    Result(ScanOutcome),
}

impl ScanPhase {
    fn name(&self) -> &'static str {
        match self {
            ScanPhase::Idle => "idle",
            ScanPhase::Starting => "starting the camera",
            ScanPhase::Scanning => "scanning",
            ScanPhase::Processing { .. } => "processing",
            ScanPhase::Result(_) => "showing a result",
        }
    }
}

struct Inner {
    camera: Arc<dyn Camera>,
    decoder: Arc<dyn FrameDecoder>,
    api: Arc<dyn CheckInApi>,
    notifier: NotificationCenter,
    scan_interval: Duration,
    phase: watch::Sender<ScanPhase>,
}

impl Inner {
    fn set_phase(&self, phase: ScanPhase) {
        debug!("QR check-in -> {}", phase.name());
        self.phase.send_replace(phase);
    }

    async fn process(&self, code: String) {
        self.set_phase(ScanPhase::Processing { code: code.clone() });

        let outcome = match self.api.check_in(&code).await {
            Ok(result) => {
                let summary = CheckInSummary::from_result(&code, &result);
                info!(
                    "Checked in {} ({} -> {}, position {})",
                    summary.queue_number, summary.previous_type, summary.queue_type, summary.position
                );
                self.notifier.success(
                    "Check-in successful",
                    format!("{} is now number {} in line", summary.patient_name, summary.position),
                );
                ScanOutcome::CheckedIn(summary)
            }
            Err(err) => {
                self.notifier.failure("Check-in failed", &err);
                ScanOutcome::Failed {
                    kind: err.kind(),
                    message: err.user_message(),
                }
            }
        };
        self.set_phase(ScanPhase::Result(outcome));
    }
}

struct ScanTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// QR check-in flow: `Idle -> Starting -> Scanning -> Processing -> Result`, back to
/// `Idle` on reset. A denied camera goes from `Starting` straight to `Result`.
///
/// The camera stream lives inside the scan task behind a [`StreamGuard`]; it is
/// released when a code is detected, when scanning is stopped, and when the task is
/// aborted on teardown.
pub struct QrCheckIn {
    inner: Arc<Inner>,
    task: Mutex<Option<ScanTask>>,
}

impl QrCheckIn {
    pub fn new(
        camera: Arc<dyn Camera>,
        decoder: Arc<dyn FrameDecoder>,
        api: Arc<dyn CheckInApi>,
        notifier: NotificationCenter,
        scan_interval: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(ScanPhase::Idle);
        Self {
            inner: Arc::new(Inner {
                camera,
                decoder,
                api,
                notifier,
                scan_interval,
                phase,
            }),
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanPhase> {
        self.inner.phase.subscribe()
    }

    pub fn phase(&self) -> ScanPhase {
        self.inner.phase.borrow().clone()
    }

    /// Moves out of `Idle` in one step, so overlapping calls cannot both proceed.
    fn claim(&self, action: &'static str, next: ScanPhase) -> Result<(), CheckInError> {
        let mut current = "idle";
        let claimed = self.inner.phase.send_if_modified(|phase| {
            if *phase == ScanPhase::Idle {
                *phase = next;
                true
            } else {
                current = phase.name();
                false
            }
        });
        if !claimed {
            return Err(CheckInError::InvalidState { action, phase: current });
        }
        debug!("QR check-in -> {}", self.inner.phase.borrow().name());
        Ok(())
    }

    /// Opens the camera and starts polling the decoder. A denied camera goes straight
    /// to a `PermissionDenied` result without ever entering `Scanning`.
    pub async fn start_scanning(&self) -> Result<(), CheckInError> {
        self.claim("start scanning", ScanPhase::Starting)?;

        let stream = match self.inner.camera.open(&CameraConstraints::default()).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!("Camera unavailable: {}", err);
                self.inner
                    .set_phase(ScanPhase::Result(ScanOutcome::PermissionDenied(err.user_message())));
                return Err(err.into());
            }
        };

        let guard = StreamGuard::new(stream);
        let (stop, stop_rx) = oneshot::channel();
        self.inner.set_phase(ScanPhase::Scanning);
        let handle = tokio::spawn(scan_loop(self.inner.clone(), guard, stop_rx));

        if let Ok(mut task) = self.task.lock() {
            if let Some(previous) = task.replace(ScanTask { stop, handle }) {
                previous.handle.abort();
            }
        }
        Ok(())
    }

    /// Manual code entry, bypassing the camera.
    pub async fn submit_code(&self, code: &str) -> Result<(), CheckInError> {
        let code = code.trim();
        if code.is_empty() {
            return self.claim(
                "submit a code",
                ScanPhase::Result(ScanOutcome::Failed {
                    kind: FailureKind::Validation,
                    message: "Enter the code printed under the QR image.".to_string(),
                }),
            );
        }
        self.claim("submit a code", ScanPhase::Processing { code: code.to_string() })?;
        self.inner.process(code.to_string()).await;
        Ok(())
    }

    /// Cancels scanning and releases the camera. A check-in already in flight is left
    /// to finish.
    pub async fn stop(&self) {
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            let _ = task.stop.send(());
            if let Err(e) = task.handle.await {
                if !e.is_cancelled() {
                    warn!("QR scan task ended abnormally: {}", e);
                }
            }
        }
    }

    /// Back to `Idle` from a result (or from scanning, which is stopped first).
    pub async fn reset(&self) {
        self.stop().await;
        if !matches!(self.phase(), ScanPhase::Processing { .. }) {
            self.inner.set_phase(ScanPhase::Idle);
        }
    }

    /// Leaving the page: aborts everything, including an in-flight check-in.
    pub async fn teardown(self) {
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            task.handle.abort();
            let _ = task.handle.await;
        }
        self.inner.set_phase(ScanPhase::Idle);
        debug!("QR check-in torn down");
    }
}

impl Drop for QrCheckIn {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.handle.abort();
            }
        }
    }
}

async fn scan_loop(inner: Arc<Inner>, mut guard: StreamGuard, mut stop: oneshot::Receiver<()>) {
    let mut ticker = interval_at(Instant::now() + inner.scan_interval, inner.scan_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let code = loop {
        tokio::select! {
            _ = &mut stop => {
                guard.release();
                inner.set_phase(ScanPhase::Idle);
                return;
            }
            _ = ticker.tick() => {
                let Some(frame) = guard.grab_frame() else {
                    continue;
                };
                if let Some(code) = inner.decoder.decode(&frame) {
                    debug!("QR code detected on frame {}", frame.sequence);
                    break code;
                }
            }
        }
    };

    guard.release();
    inner.process(code).await;
}
