use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use shared_api::WebApiClient;
use shared_models::auth::{LoginResponse, Role, Session, SessionEvent, User};
use shared_models::error::AppError;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AppError::field("email", "Email is required"));
        }
        if !email.contains('@') {
            return Err(AppError::field("email", "Enter a valid email address"));
        }
        if self.password.is_empty() {
            return Err(AppError::field("password", "Password is required"));
        }
        Ok(())
    }
}

/// Sign-in, sign-out and profile for both roles.
pub struct AuthService {
    api: WebApiClient,
}

impl AuthService {
    pub fn new(api: WebApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &WebApiClient {
        &self.api
    }

    /// Signs in against `/api/web/{role}/login` and stores the resulting session.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, role: Role, credentials: &Credentials) -> Result<Session, AppError> {
        credentials.validate()?;

        let body = json!({
            "email": credentials.email.trim(),
            "password": credentials.password,
        });
        let response: LoginResponse = self
            .api
            .post(&WebApiClient::path_for(role, "login"), body)
            .await?
            .ok_or_else(|| AppError::MalformedResponse("Login response has no data".to_string()))?;

        if response.user.role != role {
            warn!("Login as {} returned a {} account", role, response.user.role);
            return Err(AppError::Unauthorized(format!(
                "This account cannot sign in as {}",
                role
            )));
        }

        let session = Session {
            token: response.token,
            user: response.user,
            role,
            signed_in_at: Utc::now(),
        };
        self.api.session().store(session.clone())?;
        self.api.announce(SessionEvent::SignedIn(role));
        info!("Signed in as {} ({})", session.user.name, role);

        Ok(session)
    }

    /// Tells the backend to end the session, then forgets it locally whatever the
    /// backend said.
    pub async fn logout(&self) -> Result<(), AppError> {
        let role = self.api.role();
        let result = self
            .api
            .post::<serde_json::Value>(&WebApiClient::path_for(role, "logout"), json!({}))
            .await;

        if let Err(err) = &result {
            warn!("Backend logout failed, clearing local session anyway: {}", err);
        }
        self.api.session().clear();
        self.api.announce(SessionEvent::SignedOut);
        info!("Signed out");

        Ok(())
    }

    pub async fn profile(&self) -> Result<User, AppError> {
        debug!("Fetching profile");
        self.api.get(&self.api.role_path("profile")).await
    }

    pub fn current_user(&self) -> Option<User> {
        self.api.session().user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation_names_the_field() {
        let err = Credentials::new("", "secret").validate().unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("email"));

        let err = Credentials::new("dokter.rs.id", "secret").validate().unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("email"));

        let err = Credentials::new("dokter@rs.id", "").validate().unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("password"));

        assert!(Credentials::new(" dokter@rs.id ", "secret").validate().is_ok());
    }
}
