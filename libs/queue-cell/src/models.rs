use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_utils::format::{format_wait, mask_nik};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

impl QueueStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: &QueueStatus) -> bool {
        use QueueStatus::*;
        match (self, target) {
            (Waiting, InProgress) => true,
            (Waiting, Cancelled) => true,
            (InProgress, Completed) => true,
            (InProgress, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QueueStatus::Waiting => "WAITING",
            QueueStatus::InProgress => "IN_PROGRESS",
            QueueStatus::Completed => "COMPLETED",
            QueueStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

impl FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "WAITING" => Ok(QueueStatus::Waiting),
            "IN_PROGRESS" => Ok(QueueStatus::InProgress),
            "COMPLETED" => Ok(QueueStatus::Completed),
            "CANCELLED" => Ok(QueueStatus::Cancelled),
            other => Err(format!("Unknown queue status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueType {
    WalkIn,
    Appointment,
}

impl fmt::Display for QueueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueType::WalkIn => f.write_str("WALK_IN"),
            QueueType::Appointment => f.write_str("APPOINTMENT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePatient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl QueuePatient {
    pub fn masked_nik(&self) -> Option<String> {
        self.nik.as_deref().map(mask_nik)
    }
}

/// One patient's place in a doctor's line for the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: String,
    pub queue_number: String,
    pub status: QueueStatus,
    #[serde(default = "default_queue_type")]
    pub queue_type: QueueType,
    /// 1-based; zero once the entry has left the waiting list.
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub is_priority: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub called_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_wait_minutes: Option<i64>,
    pub patient: QueuePatient,
    #[serde(default)]
    pub consultation_id: Option<String>,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

fn default_queue_type() -> QueueType {
    QueueType::WalkIn
}

impl QueueEntry {
    pub fn estimated_wait_label(&self) -> Option<String> {
        self.estimated_wait_minutes.map(format_wait)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSummary {
    pub total: u32,
    pub waiting: u32,
    pub in_progress: u32,
    pub completed: u32,
    #[serde(default)]
    pub cancelled: u32,
    #[serde(default)]
    pub average_wait_minutes: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyStatus {
    pub is_on_duty: bool,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub shift_start: Option<String>,
    #[serde(default)]
    pub shift_end: Option<String>,
}

/// `GET queue/today`: the doctor's overview for the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayQueue {
    pub current: Option<QueueEntry>,
    #[serde(default)]
    pub waiting: Vec<QueueEntry>,
    #[serde(default)]
    pub completed: Vec<QueueEntry>,
    #[serde(default)]
    pub summary: QueueSummary,
    #[serde(default)]
    pub doctor: Option<DutyStatus>,
}

/// What the queue board renders: the overview plus the waiting list, fetched together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    pub today: TodayQueue,
    pub waiting: Vec<QueueEntry>,
}

impl QueueSnapshot {
    pub fn current(&self) -> Option<&QueueEntry> {
        self.today.current.as_ref()
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn next_up(&self) -> Option<&QueueEntry> {
        self.waiting.iter().min_by_key(|e| (!e.is_priority, e.position))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallNextOutcome {
    Called(QueueEntry),
    NoPatientWaiting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipPatientRequest {
    pub queue_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteConsultationRequest {
    pub queue_id: String,
    pub diagnosis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub qr_code: String,
}

/// Result of converting a walk-in entry to an appointment entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub queue: QueueEntry,
    pub previous_type: QueueType,
    pub position: u32,
    #[serde(default)]
    pub estimated_wait_minutes: Option<i64>,
}

impl CheckInResult {
    pub fn queue_type(&self) -> QueueType {
        self.queue.queue_type
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueHistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub status: Option<QueueStatus>,
}

impl QueueHistoryQuery {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("dateFrom".to_string(), from.to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("dateTo".to_string(), to.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.to_string()));
        }
        pairs
    }
}
