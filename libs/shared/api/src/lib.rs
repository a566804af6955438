pub mod client;

pub use client::{WebApiClient, API_PREFIX, HEALTH_PATH};
