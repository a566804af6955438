use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::camera::VideoFrame;

/// Turns a camera frame into a QR payload, if one is visible.
#[cfg_attr(test, mockall::automock)]
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, frame: &VideoFrame) -> Option<String>;
}

pub const SAMPLE_CODES: [&str; 3] = ["PATIENT_QR_ABC123", "PATIENT_QR_DEF456", "PATIENT_QR_GHI789"];

/// Stand-in decoder: "detects" one of a few known payloads at random.
///
/// It ignores frame content entirely. A real decoder plugs in through [`FrameDecoder`].
pub struct SimulatedDecoder {
    rng: Mutex<StdRng>,
    detect_probability: f64,
    codes: Vec<String>,
}

impl Default for SimulatedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDecoder {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy(), 0.3, default_codes())
    }

    pub fn seeded(seed: u64, detect_probability: f64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), detect_probability, default_codes())
    }

    /// Detects `code` on every frame.
    pub fn always(code: impl Into<String>) -> Self {
        Self::from_rng(StdRng::seed_from_u64(0), 1.0, vec![code.into()])
    }

    fn from_rng(rng: StdRng, detect_probability: f64, codes: Vec<String>) -> Self {
        Self {
            rng: Mutex::new(rng),
            detect_probability: detect_probability.clamp(0.0, 1.0),
            codes,
        }
    }
}

fn default_codes() -> Vec<String> {
    SAMPLE_CODES.iter().map(|c| c.to_string()).collect()
}

impl FrameDecoder for SimulatedDecoder {
    fn decode(&self, _frame: &VideoFrame) -> Option<String> {
        let mut rng = self.rng.lock().ok()?;
        if !rng.gen_bool(self.detect_probability) {
            return None;
        }
        self.codes.choose(&mut *rng).cloned()
    }
}
