use thiserror::Error;

use shared_models::error::AppError;

use crate::models::QueueStatus;
use crate::services::board::QueueDialog;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error(transparent)]
    Api(#[from] AppError),

    #[error("Invalid queue status transition from {from} to {to}")]
    InvalidStatusTransition { from: QueueStatus, to: QueueStatus },

    #[error("No consultation is in progress")]
    NoConsultationInProgress,

    #[error("Cannot open {requested:?} while {open:?} is open")]
    DialogBusy { open: QueueDialog, requested: QueueDialog },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl QueueError {
    /// Text for the error toast.
    pub fn user_message(&self) -> String {
        match self {
            QueueError::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
