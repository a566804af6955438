use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use shared_utils::validation::{FieldErrors, FieldValidator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub license_number: String,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_on_duty: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub license_number: String,
    pub room: Option<String>,
}

impl CreateDoctorRequest {
    pub fn validate(&self) -> Result<(), shared_models::error::AppError> {
        let validator = FieldValidator::global();
        let mut errors = FieldErrors::new();

        errors.require("name", &self.name, "Name");
        errors.require("specialization", &self.specialization, "Specialization");
        errors.require("licenseNumber", &self.license_number, "License number");
        if !validator.is_email(self.email.trim()) {
            errors.add("email", "Enter a valid email address");
        }
        if self.password.len() < 8 {
            errors.add("password", "Password must be at least 8 characters");
        }
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            if !validator.is_phone(phone) {
                errors.add("phone", "Enter a valid mobile number");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UpdateDoctorRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.specialization.is_none()
            && self.room.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Booked,
    Blocked,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub id: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: SlotStatus,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
}

impl ScheduleSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub date: NaiveDate,
    #[serde(default)]
    pub slots: Vec<ScheduleSlot>,
}

impl DaySchedule {
    pub fn available_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.status == SlotStatus::Available).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    #[serde(default)]
    pub days: Vec<DaySchedule>,
}

impl WeekSchedule {
    pub fn day(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn booked_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter())
            .filter(|s| s.status == SlotStatus::Booked)
            .count()
    }
}

/// A dated slot in the "upcoming" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingSlot {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub slot: ScheduleSlot,
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_start_is_monday() {
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();

        assert_eq!(week_start(thursday), monday);
        assert_eq!(week_start(monday), monday);
        assert_eq!(week_start(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()), monday);
    }

    #[test]
    fn test_create_request_reports_every_bad_field() {
        let request = CreateDoctorRequest {
            name: "dr. Sari".into(),
            email: "sari-at-rs".into(),
            password: "short".into(),
            phone: Some("12345".into()),
            specialization: "".into(),
            license_number: "STR-001".into(),
            room: None,
        };

        let err = request.validate().unwrap_err();
        let fields = err.field_errors().unwrap();
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["email", "password", "phone", "specialization"]);
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = UpdateDoctorRequest {
            room: Some("Poli 3".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({ "room": "Poli 3" }));
        assert!(UpdateDoctorRequest::default().is_empty());
    }
}
