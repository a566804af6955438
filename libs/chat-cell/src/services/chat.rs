use serde_json::to_value;
use tracing::{debug, info, instrument};

use shared_api::WebApiClient;
use shared_models::error::AppError;

use crate::error::ChatError;
use crate::models::{ChatMessage, ChatSessionsResponse, CompleteChatRequest, Conversation, SendMessageRequest};

pub const MAX_MESSAGE_LEN: usize = 2000;

/// Chat consultation endpoints under `/api/web/{role}/chat`.
pub struct ChatService {
    api: WebApiClient,
}

impl ChatService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &WebApiClient {
        &self.api
    }

    fn path(&self, resource: &str) -> String {
        self.api.role_path(&format!("chat/{}", resource))
    }

    pub async fn check_connectivity(&self) -> Result<(), AppError> {
        self.api.check_connectivity().await
    }

    /// Active sessions plus the summary counts.
    pub async fn sessions(&self) -> Result<ChatSessionsResponse, AppError> {
        debug!("Fetching active chat sessions");
        self.api.get(&self.path("sessions")).await
    }

    pub async fn conversation(&self, consultation_id: &str) -> Result<Conversation, AppError> {
        debug!("Fetching conversation {}", consultation_id);
        self.api
            .get(&self.path(&format!("conversation/{}", consultation_id)))
            .await
    }

    #[instrument(skip(self, content))]
    pub async fn send_message(&self, consultation_id: &str, content: &str) -> Result<ChatMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(ChatError::MessageTooLong { max: MAX_MESSAGE_LEN });
        }

        let body = to_value(SendMessageRequest {
            consultation_id: consultation_id.to_string(),
            content: content.to_string(),
        })
        .map_err(AppError::from)?;

        let message = self
            .api
            .post::<ChatMessage>(&self.path("message"), body)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Message response has no data".to_string()))?;
        debug!("Message {} sent", message.id);
        Ok(message)
    }

    #[instrument(skip(self, notes))]
    pub async fn complete(&self, consultation_id: &str, notes: Option<String>) -> Result<(), ChatError> {
        let body = to_value(CompleteChatRequest {
            consultation_id: consultation_id.to_string(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
        .map_err(AppError::from)?;

        self.api.post::<serde_json::Value>(&self.path("complete"), body).await?;
        info!("Chat consultation {} completed", consultation_id);
        Ok(())
    }
}
