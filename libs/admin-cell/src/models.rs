use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Headline counts for the admin home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: u64,
    pub total_doctors: u64,
    #[serde(default)]
    pub active_doctors: u64,
    #[serde(default)]
    pub today_consultations: u64,
    #[serde(default)]
    pub today_queue: u64,
    #[serde(default)]
    pub pending_prescriptions: u64,
    #[serde(default)]
    pub recent_activity: Vec<Activity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PatientRegistered,
    DoctorAdded,
    ConsultationCompleted,
    PrescriptionIssued,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    /// Free-form extra fields; shape varies by activity type.
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Result of probing the backend from the client side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendHealth {
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub checked_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

/// Everything the admin home page renders in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub health: BackendHealth,
}
