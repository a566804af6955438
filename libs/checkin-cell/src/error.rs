use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No camera found")]
    NotFound,

    #[error("Camera is already in use")]
    InUse,

    #[error("Camera error: {0}")]
    Other(String),
}

impl CameraError {
    pub fn user_message(&self) -> String {
        match self {
            CameraError::PermissionDenied => {
                "Camera access was denied. Allow camera access or enter the code manually.".to_string()
            }
            CameraError::NotFound => "No camera is available on this device.".to_string(),
            CameraError::InUse => "The camera is being used by another application.".to_string(),
            CameraError::Other(message) => format!("Could not start the camera: {}", message),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckInError {
    #[error("Cannot {action} while {phase}")]
    InvalidState { action: &'static str, phase: &'static str },

    #[error(transparent)]
    Camera(#[from] CameraError),
}
