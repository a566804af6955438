use serde_json::to_value;
use tracing::{debug, info, instrument};

use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_models::pagination::{Page, PageQuery};
use shared_utils::listing::{filter_items, paginate};

use crate::models::{CreateDoctorRequest, Doctor, UpdateDoctorRequest};

/// Doctor management under `/api/web/{role}/doctors`.
pub struct DoctorService {
    api: WebApiClient,
}

impl DoctorService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    fn path(&self, resource: &str) -> String {
        if resource.is_empty() {
            self.api.role_path("doctors")
        } else {
            self.api.role_path(&format!("doctors/{}", resource))
        }
    }

    pub async fn list(&self, query: &PageQuery) -> Result<Page<Doctor>, AppError> {
        debug!("Listing doctors: {:?}", query);
        self.api.get_query(&self.path(""), &query.to_query_pairs()).await
    }

    /// Server-side search by name, email or specialization.
    pub async fn search(&self, term: &str) -> Result<Vec<Doctor>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.api
            .get_query(&self.path("search"), &[("q".to_string(), term.to_string())])
            .await
    }

    /// Filters an already-fetched list without another request.
    pub fn filter_local(doctors: &[Doctor], term: &str, page: u32, limit: u32) -> Page<Doctor> {
        let matches = filter_items(doctors, term, |d| {
            vec![d.name.clone(), d.email.clone(), d.specialization.clone()]
        });
        paginate(&matches, page, limit)
    }

    pub async fn get(&self, id: &str) -> Result<Doctor, AppError> {
        self.api.get(&self.path(id)).await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create(&self, request: &CreateDoctorRequest) -> Result<Doctor, AppError> {
        request.validate()?;
        let doctor: Doctor = self
            .api
            .post(&self.path(""), to_value(request)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Create doctor response has no data".to_string()))?;
        info!("Created doctor {} ({})", doctor.name, doctor.id);
        Ok(doctor)
    }

    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: &UpdateDoctorRequest) -> Result<Doctor, AppError> {
        if request.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }
        let doctor: Doctor = self
            .api
            .put(&self.path(id), to_value(request)?)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Update doctor response has no data".to_string()))?;
        info!("Updated doctor {}", id);
        Ok(doctor)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.api.delete(&self.path(id)).await?;
        info!("Deleted doctor {}", id);
        Ok(())
    }
}
