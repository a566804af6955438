pub mod auth;
pub mod envelope;
pub mod error;
pub mod pagination;

pub use envelope::ApiEnvelope;
pub use error::{AppError, FailureKind};
pub use pagination::{Page, PageQuery, Pagination};
