use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, instrument, warn};

use shared_api::WebApiClient;
use shared_models::auth::Role;
use shared_models::error::AppError;

use crate::models::{BackendHealth, DashboardOverview, DashboardStats, HealthStatus};

/// Slower answers than this mark the backend as degraded.
pub const DEGRADED_AFTER: Duration = Duration::from_millis(2000);

pub struct DashboardService {
    api: WebApiClient,
}

impl DashboardService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, AppError> {
        let stats: DashboardStats = self
            .api
            .get(&WebApiClient::path_for(Role::Admin, "dashboard"))
            .await?;
        debug!(
            "Dashboard: {} patients, {} doctors, {} recent activities",
            stats.total_patients,
            stats.total_doctors,
            stats.recent_activity.len()
        );
        Ok(stats)
    }

    /// Times a connectivity check. Never fails: an unreachable backend is reported
    /// as `Unhealthy`.
    pub async fn health(&self) -> BackendHealth {
        let start = Instant::now();
        let result = self.api.check_connectivity().await;
        let elapsed = start.elapsed();

        match result {
            Ok(()) => BackendHealth {
                status: if elapsed > DEGRADED_AFTER {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                },
                response_time_ms: elapsed.as_millis() as u64,
                checked_at: Utc::now(),
                error_message: None,
            },
            Err(err) => {
                warn!("Backend health check failed: {}", err);
                BackendHealth {
                    status: HealthStatus::Unhealthy,
                    response_time_ms: elapsed.as_millis() as u64,
                    checked_at: Utc::now(),
                    error_message: Some(err.user_message()),
                }
            }
        }
    }

    /// Stats and health check, fetched concurrently.
    pub async fn overview(&self) -> Result<DashboardOverview, AppError> {
        let (stats, health) = futures::join!(self.dashboard(), self.health());
        Ok(DashboardOverview { stats: stats?, health })
    }
}
