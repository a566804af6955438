use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, instrument, warn};

use shared_models::error::AppError;

use crate::stats::{PollerStats, PollerStatsSnapshot};

/// Source of the data a pollable resource keeps fresh.
#[async_trait]
pub trait Fetch<T>: Send + Sync + 'static {
    async fn fetch(&self) -> Result<T, AppError>;
}

/// Adapts an async closure into a [`Fetch`].
pub struct FnFetch<F>(pub F);

#[async_trait]
impl<T, F, Fut> Fetch<T> for FnFetch<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<T, AppError> {
        (self.0)().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Timer armed, recurring fetches run.
    Enabled,
    /// A blocking dialog is open: no timer, no fetches.
    Suspended,
    /// Torn down.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Timer,
    Resume,
    Manual,
    /// Something changed server-side; runs after any fetch already in flight.
    Invalidated,
}

impl Trigger {
    /// Initial and manual loads show the spinner; background ones do not.
    fn is_foreground(self) -> bool {
        matches!(self, Trigger::Initial | Trigger::Manual)
    }
}

/// What a page renders from a pollable resource.
#[derive(Debug)]
pub struct ResourceState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<AppError>,
    pub last_updated: Option<DateTime<Utc>>,
    pub fetch_count: u64,
    pub phase: PollPhase,
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            refreshing: self.refreshing,
            error: self.error.clone(),
            last_updated: self.last_updated,
            fetch_count: self.fetch_count,
            phase: self.phase,
        }
    }
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            refreshing: false,
            error: None,
            last_updated: None,
            fetch_count: 0,
            phase: PollPhase::Enabled,
        }
    }
}

impl<T> ResourceState<T> {
    pub fn is_busy(&self) -> bool {
        self.loading || self.refreshing
    }
}

enum Command {
    Suspend(oneshot::Sender<()>),
    Resume(oneshot::Sender<()>),
    Refresh(oneshot::Sender<bool>),
    Invalidate(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// A recurring fetch with an enable/disable gate and a single in-flight guard.
///
/// One driver task owns the timer and every fetch task. Dropping the handle tears
/// the driver down, which cancels the timer and aborts any fetch still running.
pub struct PollableResource<T: Send + Sync + 'static> {
    label: String,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ResourceState<T>>,
    stats: Arc<PollerStats>,
    driver: Option<JoinHandle<()>>,
}

impl<T: Send + Sync + 'static> PollableResource<T> {
    /// Fetches immediately (with loading indicator), then every `interval`.
    pub fn start(label: impl Into<String>, fetcher: Arc<dyn Fetch<T>>, interval: Duration) -> Self {
        let label = label.into();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ResourceState::default());
        let stats = Arc::new(PollerStats::default());

        let mut driver = Driver {
            label: label.clone(),
            fetcher,
            interval,
            state: state_tx,
            stats: stats.clone(),
            tasks: JoinSet::new(),
            in_flight: false,
            refetch_pending: false,
            next_tick: None,
            phase: PollPhase::Enabled,
        };
        driver.arm();
        driver.begin_fetch(Trigger::Initial);

        debug!("Pollable resource '{}' mounted (every {:?})", label, interval);
        let handle = tokio::spawn(driver.run(command_rx));

        Self {
            label,
            commands,
            state,
            stats,
            driver: Some(handle),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> PollPhase {
        self.state.borrow().phase
    }

    pub fn stats(&self) -> PollerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Live counters that outlive the handle, for checking teardown.
    pub fn stats_handle(&self) -> Arc<PollerStats> {
        self.stats.clone()
    }

    /// Cancels the armed timer. No fetch happens until [`resume`](Self::resume).
    pub async fn suspend(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Suspend(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Fetches once without the loading indicator and re-arms the timer.
    pub async fn resume(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Resume(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Manual foreground fetch. Returns `false` when it was dropped because a
    /// fetch is already in flight or the resource is suspended.
    pub async fn refresh(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Refresh(ack)).is_err() {
            return false;
        }
        done.await.unwrap_or(false)
    }

    /// Marks the data stale after a mutation: fetches quietly now, or exactly once
    /// after the fetch in flight lands, since that one may predate the change.
    /// Ignored while suspended; resuming fetches anyway.
    pub async fn invalidate(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Invalidate(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Tears the resource down and waits for the driver to finish.
    pub async fn unmount(mut self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                if !e.is_cancelled() {
                    warn!("Poll driver '{}' ended abnormally: {}", self.label, e);
                }
            }
        }
        debug!("Pollable resource '{}' unmounted", self.label);
    }
}

impl<T: Send + Sync + 'static> Drop for PollableResource<T> {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

struct Driver<T: Send + Sync + 'static> {
    label: String,
    fetcher: Arc<dyn Fetch<T>>,
    interval: Duration,
    state: watch::Sender<ResourceState<T>>,
    stats: Arc<PollerStats>,
    tasks: JoinSet<Result<T, AppError>>,
    in_flight: bool,
    refetch_pending: bool,
    next_tick: Option<Instant>,
    phase: PollPhase,
}

impl<T: Send + Sync + 'static> Driver<T> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.next_tick;
            let tick = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Suspend(ack)) => {
                        self.suspend();
                        let _ = ack.send(());
                    }
                    Some(Command::Resume(ack)) => {
                        self.resume();
                        let _ = ack.send(());
                    }
                    Some(Command::Refresh(ack)) => {
                        let accepted = self.manual_refresh();
                        let _ = ack.send(accepted);
                    }
                    Some(Command::Invalidate(ack)) => {
                        if self.phase == PollPhase::Enabled {
                            self.fetch_or_queue(Trigger::Invalidated);
                        }
                        let _ = ack.send(());
                    }
                    Some(Command::Shutdown(ack)) => {
                        self.stop();
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.stop();
                        break;
                    }
                },
                _ = tick => self.on_tick(),
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.finish_fetch(joined);
                }
            }
        }
    }

    fn arm(&mut self) {
        self.next_tick = Some(Instant::now() + self.interval);
        self.stats.timer_armed();
        debug!("'{}' timer armed", self.label);
    }

    fn disarm(&mut self) {
        if self.next_tick.take().is_some() {
            self.stats.timer_cancelled();
            debug!("'{}' timer cancelled", self.label);
        }
    }

    fn set_phase(&mut self, phase: PollPhase) {
        self.phase = phase;
        self.state.send_modify(|s| s.phase = phase);
    }

    fn on_tick(&mut self) {
        if self.phase != PollPhase::Enabled {
            self.next_tick = None;
            return;
        }
        self.next_tick = Some(Instant::now() + self.interval);
        self.begin_fetch(Trigger::Timer);
    }

    fn suspend(&mut self) {
        if self.phase != PollPhase::Enabled {
            return;
        }
        self.disarm();
        self.refetch_pending = false;
        self.set_phase(PollPhase::Suspended);
    }

    fn resume(&mut self) {
        if self.phase != PollPhase::Suspended {
            return;
        }
        self.set_phase(PollPhase::Enabled);
        self.fetch_or_queue(Trigger::Resume);
        self.arm();
    }

    fn manual_refresh(&mut self) -> bool {
        if self.phase != PollPhase::Enabled {
            debug!("'{}' is suspended, manual refresh ignored", self.label);
            self.stats.fetch_dropped();
            return false;
        }
        self.begin_fetch(Trigger::Manual)
    }

    fn stop(&mut self) {
        self.disarm();
        self.tasks.abort_all();
        self.in_flight = false;
        self.refetch_pending = false;
        self.phase = PollPhase::Stopped;
        self.state.send_modify(|s| {
            s.phase = PollPhase::Stopped;
            s.loading = false;
            s.refreshing = false;
        });
    }

    /// Unlike timer and manual fetches, a state-changing fetch is never dropped.
    fn fetch_or_queue(&mut self, trigger: Trigger) {
        if self.in_flight {
            debug!("'{}' {:?} fetch queued behind the one in flight", self.label, trigger);
            self.refetch_pending = true;
        } else {
            self.begin_fetch(trigger);
        }
    }

    #[instrument(skip(self), fields(resource = %self.label))]
    fn begin_fetch(&mut self, trigger: Trigger) -> bool {
        if self.in_flight {
            debug!("Fetch already in flight, dropping {:?} request", trigger);
            self.stats.fetch_dropped();
            return false;
        }

        self.in_flight = true;
        self.stats.fetch_started();
        let foreground = trigger.is_foreground();
        self.state.send_modify(|s| {
            if foreground {
                s.loading = true;
            } else {
                s.refreshing = true;
            }
        });

        let fetcher = self.fetcher.clone();
        self.tasks.spawn(async move { fetcher.fetch().await });
        true
    }

    fn finish_fetch(&mut self, joined: Result<Result<T, AppError>, JoinError>) {
        self.in_flight = false;

        match joined {
            Ok(Ok(data)) => {
                self.stats.fetch_completed();
                self.state.send_modify(|s| {
                    s.data = Some(Arc::new(data));
                    s.error = None;
                    s.last_updated = Some(Utc::now());
                    s.fetch_count += 1;
                    s.loading = false;
                    s.refreshing = false;
                });
            }
            Ok(Err(err)) => {
                warn!("'{}' fetch failed: {}", self.label, err);
                self.stats.fetch_failed();
                // Keep showing whatever was rendered before.
                self.state.send_modify(|s| {
                    s.error = Some(err);
                    s.loading = false;
                    s.refreshing = false;
                });
            }
            Err(join_err) if join_err.is_cancelled() => {}
            Err(join_err) => {
                warn!("'{}' fetch task panicked: {}", self.label, join_err);
                self.stats.fetch_failed();
                self.state.send_modify(|s| {
                    s.error = Some(AppError::Api(format!("Fetch task failed: {}", join_err)));
                    s.loading = false;
                    s.refreshing = false;
                });
            }
        }

        if self.refetch_pending && self.phase == PollPhase::Enabled {
            self.refetch_pending = false;
            self.begin_fetch(Trigger::Invalidated);
        }
    }
}

impl<T: Send + Sync + 'static> Drop for Driver<T> {
    fn drop(&mut self) {
        // Reached when the handle was dropped without `unmount()`.
        self.disarm();
        self.tasks.abort_all();
    }
}
