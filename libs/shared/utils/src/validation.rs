use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use shared_models::error::AppError;

/// Patterns for the identity fields forms check before submitting.
pub struct FieldValidator {
    email: Regex,
    nik: Regex,
    phone: Regex,
}

static VALIDATOR: OnceLock<FieldValidator> = OnceLock::new();

impl FieldValidator {
    pub fn global() -> &'static FieldValidator {
        VALIDATOR.get_or_init(FieldValidator::new)
    }

    fn new() -> Self {
        Self {
            email: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern"),
            // 16-digit national identity number.
            nik: Regex::new(r"^\d{16}$").expect("nik pattern"),
            // Indonesian mobile numbers: 08, 628 or +628 followed by 7 to 11 digits.
            phone: Regex::new(r"^(\+62|62|0)8[1-9]\d{6,10}$").expect("phone pattern"),
        }
    }

    pub fn is_email(&self, value: &str) -> bool {
        value.len() <= 254 && self.email.is_match(value)
    }

    pub fn is_nik(&self, value: &str) -> bool {
        self.nik.is_match(value)
    }

    pub fn is_phone(&self, value: &str) -> bool {
        let compact: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        self.phone.is_match(&compact)
    }
}

/// Collects per-field messages and turns them into a single validation error.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn require(&mut self, field: &str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{} is required", label));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let message = if self.fields.len() == 1 {
            self.fields.values().next().cloned().unwrap_or_default()
        } else {
            format!("{} fields need attention", self.fields.len())
        };
        Err(AppError::Validation {
            message,
            fields: self.fields,
        })
    }
}
