use serde_json::to_value;
use tracing::{debug, info, instrument};

use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_models::pagination::Page;

use crate::models::{CreatePrescriptionRequest, Prescription, PrescriptionHistoryQuery};

pub struct PrescriptionService {
    api: WebApiClient,
}

impl PrescriptionService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    fn path(&self, resource: &str) -> String {
        if resource.is_empty() {
            self.api.role_path("prescriptions")
        } else {
            self.api.role_path(&format!("prescriptions/{}", resource))
        }
    }

    pub async fn today(&self) -> Result<Vec<Prescription>, AppError> {
        debug!("Fetching today's prescriptions");
        self.api.get(&self.path("today")).await
    }

    pub async fn history(&self, query: &PrescriptionHistoryQuery) -> Result<Page<Prescription>, AppError> {
        self.api
            .get_query(&self.path("history"), &query.to_query_pairs())
            .await
    }

    pub async fn detail(&self, id: &str) -> Result<Prescription, AppError> {
        self.api.get(&self.path(id)).await
    }

    #[instrument(skip(self, request), fields(patient_id = %request.patient_id))]
    pub async fn create(&self, request: &CreatePrescriptionRequest) -> Result<Prescription, AppError> {
        request.validate()?;
        let prescription: Prescription = self
            .api
            .post(&self.path(""), to_value(request)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Create prescription response has no data".to_string()))?;
        info!(
            "Issued prescription {} with {} item(s)",
            prescription.prescription_number,
            prescription.items.len()
        );
        Ok(prescription)
    }
}
