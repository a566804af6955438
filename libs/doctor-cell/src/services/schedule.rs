use chrono::NaiveDate;
use tracing::debug;

use shared_api::WebApiClient;
use shared_models::error::AppError;

use crate::models::{week_start, UpcomingSlot, WeekSchedule};

pub const DEFAULT_UPCOMING_DAYS: u32 = 7;

/// The signed-in doctor's practice schedule.
pub struct ScheduleService {
    api: WebApiClient,
}

impl ScheduleService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    fn path(&self, resource: &str) -> String {
        self.api.role_path(&format!("schedules/{}", resource))
    }

    pub async fn current_week(&self) -> Result<WeekSchedule, AppError> {
        debug!("Fetching current week schedule");
        self.api.get(&self.path("current-week")).await
    }

    /// The week containing `date`; the request always names that week's Monday.
    pub async fn week(&self, date: NaiveDate) -> Result<WeekSchedule, AppError> {
        let start = week_start(date);
        debug!("Fetching schedule for week of {}", start);
        self.api
            .get_query(
                &self.path("week"),
                &[("startDate".to_string(), start.format("%Y-%m-%d").to_string())],
            )
            .await
    }

    pub async fn upcoming(&self, days: Option<u32>) -> Result<Vec<UpcomingSlot>, AppError> {
        let days = days.unwrap_or(DEFAULT_UPCOMING_DAYS).clamp(1, 31);
        self.api
            .get_query(&self.path("upcoming"), &[("days".to_string(), days.to_string())])
            .await
    }
}
