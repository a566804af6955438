pub mod camera;
pub mod decoder;
pub mod error;
pub mod scanner;

pub use camera::{Camera, CameraConstraints, FacingMode, MediaStream, SimulatedCamera, StreamGuard, VideoFrame};
pub use decoder::{FrameDecoder, SimulatedDecoder, SAMPLE_CODES};
pub use error::{CameraError, CheckInError};
pub use scanner::{CheckInApi, CheckInSummary, QrCheckIn, ScanOutcome, ScanPhase};
