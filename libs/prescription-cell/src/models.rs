use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::error::AppError;
use shared_utils::format::mask_nik;
use shared_utils::validation::FieldErrors;

pub const MAX_DURATION_DAYS: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DosageForm {
    Tablet,
    Capsule,
    Syrup,
    Injection,
    Ointment,
    Drops,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub form: DosageForm,
    pub strength: Option<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl Medication {
    pub fn label(&self) -> String {
        match &self.strength {
            Some(strength) => format!("{} {}", self.name, strength),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationForm {
    pub name: String,
    pub generic_name: Option<String>,
    pub form: DosageForm,
    pub strength: Option<String>,
    pub stock: u32,
}

impl MedicationForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, "Medication name");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionPatient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nik: Option<String>,
}

impl PrescriptionPatient {
    pub fn masked_nik(&self) -> Option<String> {
        self.nik.as_deref().map(mask_nik)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItem {
    pub medication_id: String,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u32,
    pub quantity: u32,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub prescription_number: String,
    pub patient: PrescriptionPatient,
    pub consultation_id: Option<String>,
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub items: Vec<PrescriptionItem>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
}

impl Prescription {
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItemInput {
    pub medication_id: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u32,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    pub patient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_id: Option<String>,
    pub diagnosis: String,
    pub items: Vec<PrescriptionItemInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreatePrescriptionRequest {
    /// Field keys for item problems are `items[i].field`.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = FieldErrors::new();
        errors.require("patientId", &self.patient_id, "Patient");
        errors.require("diagnosis", &self.diagnosis, "Diagnosis");
        if self.items.is_empty() {
            errors.add("items", "Add at least one medication");
        }

        let mut seen = HashSet::new();
        for (i, item) in self.items.iter().enumerate() {
            let key = |field: &str| format!("items[{}].{}", i, field);
            if item.medication_id.trim().is_empty() {
                errors.add(&key("medicationId"), "Select a medication");
            } else if !seen.insert(item.medication_id.trim()) {
                errors.add(&key("medicationId"), "Medication is already on this prescription");
            }
            errors.require(&key("dosage"), &item.dosage, "Dosage");
            errors.require(&key("frequency"), &item.frequency, "Frequency");
            if item.quantity == 0 {
                errors.add(&key("quantity"), "Quantity must be at least 1");
            }
            if item.duration_days == 0 || item.duration_days > MAX_DURATION_DAYS {
                errors.add(
                    &key("durationDays"),
                    format!("Duration must be between 1 and {} days", MAX_DURATION_DAYS),
                );
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrescriptionHistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub patient_id: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl PrescriptionHistoryQuery {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(patient_id) = &self.patient_id {
            pairs.push(("patientId".to_string(), patient_id.clone()));
        }
        if let Some(from) = self.date_from {
            pairs.push(("dateFrom".to_string(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            pairs.push(("dateTo".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}
