use serde_json::{json, to_value};
use tracing::{debug, info, instrument};

use shared_api::WebApiClient;
use shared_models::error::AppError;
use shared_models::pagination::Page;

use crate::models::{
    CallNextOutcome, CheckInRequest, CheckInResult, CompleteConsultationRequest, QueueEntry,
    QueueHistoryQuery, SkipPatientRequest, TodayQueue,
};

/// Queue endpoints under `/api/web/{role}/queue`.
pub struct QueueService {
    api: WebApiClient,
}

impl QueueService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &WebApiClient {
        &self.api
    }

    fn path(&self, resource: &str) -> String {
        self.api.role_path(&format!("queue/{}", resource))
    }

    /// Today's overview: current consultation, waiting and completed lists, counts, duty status.
    pub async fn today(&self) -> Result<TodayQueue, AppError> {
        debug!("Fetching today's queue overview");
        self.api.get(&self.path("today")).await
    }

    pub async fn waiting(&self) -> Result<Vec<QueueEntry>, AppError> {
        debug!("Fetching waiting list");
        self.api.get(&self.path("waiting")).await
    }

    pub async fn history(&self, query: &QueueHistoryQuery) -> Result<Page<QueueEntry>, AppError> {
        debug!("Fetching queue history: {:?}", query);
        self.api
            .get_query(&self.path("history"), &query.to_query_pairs())
            .await
    }

    /// Moves the head of the waiting list into consultation.
    ///
    /// An empty waiting list is a normal outcome, not an error: the backend answers
    /// 404 (or an empty `data`) and this returns [`CallNextOutcome::NoPatientWaiting`].
    #[instrument(skip(self))]
    pub async fn call_next(&self) -> Result<CallNextOutcome, AppError> {
        match self
            .api
            .post::<QueueEntry>(&self.path("call-next"), json!({}))
            .await
        {
            Ok(Some(entry)) => {
                info!("Called {} ({})", entry.queue_number, entry.id);
                Ok(CallNextOutcome::Called(entry))
            }
            Ok(None) | Err(AppError::NotFound(_)) => {
                debug!("No patient waiting");
                Ok(CallNextOutcome::NoPatientWaiting)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, request), fields(queue_id = %request.queue_id))]
    pub async fn skip(&self, request: &SkipPatientRequest) -> Result<Option<QueueEntry>, AppError> {
        if request.queue_id.trim().is_empty() {
            return Err(AppError::field("queueId", "Select a patient to skip"));
        }
        let body = to_value(request)?;
        let skipped = self.api.post(&self.path("skip"), body).await?;
        info!("Skipped queue entry {}", request.queue_id);
        Ok(skipped)
    }

    #[instrument(skip(self, request), fields(queue_id = %request.queue_id))]
    pub async fn complete(
        &self,
        request: &CompleteConsultationRequest,
    ) -> Result<Option<QueueEntry>, AppError> {
        validate_completion(request)?;
        let body = to_value(request)?;
        let completed = self.api.post(&self.path("complete"), body).await?;
        info!("Completed consultation for queue entry {}", request.queue_id);
        Ok(completed)
    }

    /// Converts a walk-in entry into an appointment entry from a scanned QR payload.
    #[instrument(skip(self))]
    pub async fn check_in(&self, qr_code: &str) -> Result<CheckInResult, AppError> {
        let code = qr_code.trim();
        if code.is_empty() {
            return Err(AppError::field("qrCode", "QR code is empty"));
        }
        let body = to_value(CheckInRequest {
            qr_code: code.to_string(),
        })?;
        self.api
            .post::<CheckInResult>(&self.path("check-in"), body)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Check-in response has no data".to_string()))
    }
}

fn validate_completion(request: &CompleteConsultationRequest) -> Result<(), AppError> {
    if request.queue_id.trim().is_empty() {
        return Err(AppError::field("queueId", "No consultation selected"));
    }
    if request.diagnosis.trim().is_empty() {
        return Err(AppError::field("diagnosis", "Diagnosis is required"));
    }
    Ok(())
}
