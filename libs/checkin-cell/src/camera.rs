use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::CameraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A live camera stream. Each live track holds the device until `stop` is called.
pub trait MediaStream: Send {
    fn grab_frame(&mut self) -> Option<VideoFrame>;
    fn active_tracks(&self) -> usize;
    fn stop(&mut self);
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self, constraints: &CameraConstraints) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// Owns a stream and stops every track when dropped, so the camera is released on
/// every exit path.
pub struct StreamGuard {
    stream: Option<Box<dyn MediaStream>>,
}

impl StreamGuard {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self { stream: Some(stream) }
    }

    pub fn grab_frame(&mut self) -> Option<VideoFrame> {
        self.stream.as_mut().and_then(|s| s.grab_frame())
    }

    pub fn active_tracks(&self) -> usize {
        self.stream.as_ref().map(|s| s.active_tracks()).unwrap_or(0)
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream released");
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Camera that produces blank frames, for terminals and tests.
///
/// Tracks how many tracks are live across all streams it handed out, and refuses a
/// second stream while one is still open.
pub struct SimulatedCamera {
    permission_granted: bool,
    live_tracks: Arc<AtomicUsize>,
    streams_opened: AtomicUsize,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            permission_granted: true,
            live_tracks: Arc::new(AtomicUsize::new(0)),
            streams_opened: AtomicUsize::new(0),
        }
    }

    pub fn denied() -> Self {
        Self {
            permission_granted: false,
            ..Self::new()
        }
    }

    pub fn active_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for SimulatedCamera {
    async fn open(&self, constraints: &CameraConstraints) -> Result<Box<dyn MediaStream>, CameraError> {
        if !self.permission_granted {
            return Err(CameraError::PermissionDenied);
        }
        if self.active_tracks() > 0 {
            return Err(CameraError::InUse);
        }

        self.live_tracks.fetch_add(1, Ordering::SeqCst);
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated camera opened ({}x{})", constraints.width, constraints.height);

        Ok(Box::new(SimulatedStream {
            constraints: *constraints,
            live_tracks: self.live_tracks.clone(),
            live: true,
            sequence: 0,
        }))
    }
}

struct SimulatedStream {
    constraints: CameraConstraints,
    live_tracks: Arc<AtomicUsize>,
    live: bool,
    sequence: u64,
}

impl MediaStream for SimulatedStream {
    fn grab_frame(&mut self) -> Option<VideoFrame> {
        if !self.live {
            return None;
        }
        self.sequence += 1;
        Some(VideoFrame {
            sequence: self.sequence,
            width: self.constraints.width,
            height: self.constraints.height,
            data: Vec::new(),
        })
    }

    fn active_tracks(&self) -> usize {
        usize::from(self.live)
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.live_tracks.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        self.stop();
    }
}
