use serde_json::to_value;
use tracing::{debug, info, instrument};

use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_models::pagination::{Page, PageQuery};

use crate::models::{Patient, PatientForm};

/// Patient records under `/api/web/{role}/patients`.
pub struct PatientService {
    api: WebApiClient,
}

impl PatientService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    fn path(&self, resource: &str) -> String {
        if resource.is_empty() {
            self.api.role_path("patients")
        } else {
            self.api.role_path(&format!("patients/{}", resource))
        }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<Patient>, AppError> {
        self.api.get_query(&self.path(""), &query.to_query_pairs()).await
    }

    /// Search by name, NIK or phone. Terms shorter than two characters return nothing.
    pub async fn search(&self, term: &str) -> Result<Vec<Patient>, AppError> {
        let term = term.trim();
        if term.chars().count() < 2 {
            return Ok(Vec::new());
        }
        debug!("Searching patients for {:?}", term);
        self.api
            .get_query(&self.path("search"), &[("q".to_string(), term.to_string())])
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Patient, AppError> {
        self.api.get(&self.path(id)).await
    }

    #[instrument(skip(self, form))]
    pub async fn create(&self, form: &PatientForm) -> Result<Patient, AppError> {
        let form = form.normalized();
        form.validate()?;
        let patient: Patient = self
            .api
            .post(&self.path(""), to_value(&form)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Create patient response has no data".to_string()))?;
        info!("Registered patient {} (NIK {})", patient.id, patient.masked_nik());
        Ok(patient)
    }

    #[instrument(skip(self, form))]
    pub async fn update(&self, id: &str, form: &PatientForm) -> Result<Patient, AppError> {
        let form = form.normalized();
        form.validate()?;
        let patient: Patient = self
            .api
            .put(&self.path(id), to_value(&form)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Update patient response has no data".to_string()))?;
        info!("Updated patient {}", id);
        Ok(patient)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.api.delete(&self.path(id)).await?;
        info!("Deleted patient {}", id);
        Ok(())
    }
}
