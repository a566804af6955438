use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;
use shared_utils::format::mask_nik;
use shared_utils::validation::{FieldErrors, FieldValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Patient {
    /// NIK as shown in lists and detail headers.
    pub fn masked_nik(&self) -> String {
        mask_nik(&self.nik)
    }

    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth.and_then(|dob| today.years_since(dob))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub name: String,
    pub nik: String,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl PatientForm {
    /// Inline field checks run before anything is sent.
    pub fn validate(&self) -> Result<(), AppError> {
        let validator = FieldValidator::global();
        let mut errors = FieldErrors::new();

        errors.require("name", &self.name, "Name");
        if !validator.is_nik(self.nik.trim()) {
            errors.add("nik", "NIK must be exactly 16 digits");
        }
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            if !validator.is_phone(phone.trim()) {
                errors.add("phone", "Enter a valid Indonesian mobile number (e.g. 0812...)");
            }
        }
        if let Some(dob) = self.date_of_birth {
            if dob > Utc::now().date_naive() {
                errors.add("dateOfBirth", "Date of birth cannot be in the future");
            }
        }
        errors.into_result()
    }

    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            nik: self.nik.trim().to_string(),
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> PatientForm {
        PatientForm {
            name: "Siti Aminah".into(),
            nik: "3201234567890123".into(),
            phone: Some("081234567890".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_short_nik_and_bad_phone_are_field_errors() {
        let bad = PatientForm {
            nik: "32012345".into(),
            phone: Some("12345".into()),
            ..form()
        };
        let err = bad.validate().unwrap_err();
        let fields = err.field_errors().unwrap();

        assert!(fields.contains_key("nik"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn test_blank_phone_is_optional() {
        let no_phone = PatientForm {
            phone: Some("  ".into()),
            ..form()
        };
        assert!(no_phone.validate().is_ok());
        assert_eq!(no_phone.normalized().phone, None);
    }

    #[test]
    fn test_masked_nik() {
        let patient: Patient = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "name": "Siti",
            "nik": "3201234567890123",
            "dateOfBirth": "1990-06-15"
        }))
        .unwrap();

        assert_eq!(patient.masked_nik(), "3201****0123");
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()), Some(36));
    }
}
