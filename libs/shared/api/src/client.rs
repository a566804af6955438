use std::sync::Arc;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, SessionEvent};
use shared_models::envelope::ApiEnvelope;
use shared_models::error::AppError;
use shared_utils::session::SessionProvider;

pub const API_PREFIX: &str = "/api/web";
pub const HEALTH_PATH: &str = "/api/web/health";

/// HTTP client for the `/api/web/{role}/...` backend.
///
/// Decodes the `{ success, message, data, error }` envelope and classifies every
/// failure into an [`AppError`]. A 401 anywhere clears the session and announces
/// [`SessionEvent::Expired`].
#[derive(Clone)]
pub struct WebApiClient {
    client: Client,
    base_url: String,
    default_role: Role,
    session: Arc<dyn SessionProvider>,
    events: broadcast::Sender<SessionEvent>,
}

impl WebApiClient {
    pub fn new(config: &AppConfig, session: Arc<dyn SessionProvider>) -> Result<Self, AppError> {
        let default_role = config.default_role.parse::<Role>()?;
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Cannot build HTTP client: {}", e)))?;
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            default_role,
            session,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionProvider> {
        &self.session
    }

    /// Role of the signed-in user, falling back to the configured one.
    pub fn role(&self) -> Role {
        self.session.role().unwrap_or(self.default_role)
    }

    /// `/api/web/{role}/{resource}` for the current role.
    pub fn role_path(&self, resource: &str) -> String {
        Self::path_for(self.role(), resource)
    }

    pub fn path_for(role: Role, resource: &str) -> String {
        format!("{}/{}/{}", API_PREFIX, role.as_segment(), resource.trim_start_matches('/'))
    }

    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn announce(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No listener for session event {:?}", event);
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Ok(request_id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert("X-Request-Id", request_id);
        }

        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Session token contains invalid header characters, sending without it"),
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {} {}", method, url);

        let mut req = self.client.request(method.clone(), &url).headers(self.get_headers());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            error!("Request to {} failed: {}", url, e);
            AppError::Network(e.to_string())
        })?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            error!("API error ({}) for {} {}: {}", status, method, path, excerpt(&text));
            return Err(self.classify_failure(status, path, &text, is_json));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        if !is_json && looks_like_html(&text) {
            error!("Expected JSON from {} but got markup", path);
            return Err(AppError::MalformedResponse(excerpt(&text)));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
            if serde_json::from_str::<Value>(&text).is_err() {
                AppError::MalformedResponse(excerpt(&text))
            } else {
                AppError::Decode(format!("{} ({})", e, path))
            }
        })?;

        envelope.into_result()
    }

    fn classify_failure(&self, status: StatusCode, path: &str, text: &str, is_json: bool) -> AppError {
        let envelope = serde_json::from_str::<ApiEnvelope<Value>>(text).ok();
        let reason = envelope
            .as_ref()
            .map(ApiEnvelope::reason)
            .unwrap_or_else(|| excerpt(text));

        match status.as_u16() {
            401 => {
                self.expire_session();
                AppError::Unauthorized(reason)
            }
            404 => AppError::NotFound(envelope.map(|e| e.reason()).unwrap_or_else(|| path.to_string())),
            code if code >= 500 => AppError::Server { status: code, message: reason },
            _ if !is_json && looks_like_html(text) => AppError::MalformedResponse(excerpt(text)),
            400 | 422 => match envelope {
                Some(env) => match env.into_result() {
                    Err(err @ AppError::Validation { .. }) => err,
                    _ => AppError::validation(reason),
                },
                None => AppError::validation(reason),
            },
            _ => AppError::Api(reason),
        }
    }

    fn expire_session(&self) {
        warn!("Received 401 from API, clearing session");
        self.session.clear();
        self.announce(SessionEvent::Expired);
    }

    /// GET where `data` must be present.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        self.get_query(path, &[]).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, AppError> {
        self.request::<T>(Method::GET, path, query, None)
            .await?
            .ok_or_else(|| AppError::MalformedResponse(format!("Response from {} has no data", path)))
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<Option<T>, AppError> {
        self.request::<T>(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<Option<T>, AppError> {
        self.request::<T>(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        self.request::<Value>(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    /// Confirms the backend is reachable and speaking JSON.
    pub async fn check_connectivity(&self) -> Result<(), AppError> {
        self.request::<Value>(Method::GET, HEALTH_PATH, &[], None).await?;
        Ok(())
    }
}

fn looks_like_html(text: &str) -> bool {
    text.trim_start().starts_with('<')
}

fn excerpt(text: &str) -> String {
    text.chars().take(200).collect()
}
