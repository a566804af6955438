use serde_json::to_value;
use tracing::{info, instrument};

use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_models::pagination::{Page, PageQuery};

use crate::models::{Medication, MedicationForm};

/// Formulary management under `/api/web/{role}/medications`.
pub struct MedicationService {
    api: WebApiClient,
}

impl MedicationService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    fn path(&self, resource: &str) -> String {
        if resource.is_empty() {
            self.api.role_path("medications")
        } else {
            self.api.role_path(&format!("medications/{}", resource))
        }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<Medication>, AppError> {
        self.api.get_query(&self.path(""), &query.to_query_pairs()).await
    }

    /// Active medications matching `term`, for the prescription form picker.
    pub async fn search(&self, term: &str) -> Result<Vec<Medication>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<Medication> = self
            .api
            .get_query(&self.path("search"), &[("q".to_string(), term.to_string())])
            .await?;
        Ok(found.into_iter().filter(|m| m.is_active).collect())
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create(&self, form: &MedicationForm) -> Result<Medication, AppError> {
        form.validate()?;
        let medication: Medication = self
            .api
            .post(&self.path(""), to_value(form)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Create medication response has no data".to_string()))?;
        info!("Added medication {}", medication.label());
        Ok(medication)
    }

    #[instrument(skip(self, form))]
    pub async fn update(&self, id: &str, form: &MedicationForm) -> Result<Medication, AppError> {
        form.validate()?;
        self.api
            .put(&self.path(id), to_value(form)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Update medication response has no data".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.api.delete(&self.path(id)).await?;
        info!("Removed medication {}", id);
        Ok(())
    }
}
