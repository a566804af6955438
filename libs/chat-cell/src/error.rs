use thiserror::Error;

use shared_models::error::{AppError, FailureKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error(transparent)]
    Api(#[from] AppError),

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message is longer than {max} characters")]
    MessageTooLong { max: usize },
}

/// Error state the session list shows in place of its rows, with a "Try Again" action
/// when `retryable` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
}

impl From<&AppError> for LoadFailure {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            retryable: err.is_retryable(),
        }
    }
}
