use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, Session, User};

use crate::session::MemorySessionStore;

pub struct TestConfig {
    pub api_base_url: String,
    pub role: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            role: "doctor".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            api_base_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            default_role: self.role.clone(),
            http_timeout_seconds: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@rs.id", Role::Doctor)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("Test {}", role),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: Some(self.email.clone()),
            role: self.role,
            specialization: None,
        }
    }

    pub fn session(&self, token: Option<String>) -> Session {
        Session {
            token,
            user: self.to_user(),
            role: self.role,
            signed_in_at: Utc::now(),
        }
    }

    /// Signed-in in-memory session with a valid bearer token.
    pub fn memory_session(&self) -> Arc<MemorySessionStore> {
        let token = TestTokens::valid_for(self, Duration::hours(24));
        Arc::new(MemorySessionStore::with_session(self.session(Some(token))))
    }
}

/// Bearer tokens shaped like the backend's: HS256 over `sub`, `email`, `role`, `iat`, `exp`.
pub struct TestTokens;

impl TestTokens {
    const SECRET: &'static [u8] = b"test-secret";

    pub fn valid_for(user: &TestUser, ttl: Duration) -> String {
        let issued = Utc::now();
        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role.as_segment(),
            "iat": issued.timestamp(),
            "exp": (issued + ttl).timestamp()
        });
        Self::sign(&claims)
    }

    pub fn expired(user: &TestUser) -> String {
        Self::valid_for(user, Duration::minutes(-5))
    }

    pub fn malformed() -> String {
        "not-a-token".to_string()
    }

    fn sign(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({ "alg": "HS256", "typ": "JWT" }).to_string());
        let body = format!("{}.{}", header, URL_SAFE_NO_PAD.encode(claims.to_string()));

        let mut mac = Hmac::<Sha256>::new_from_slice(Self::SECRET).expect("any key length works for HMAC");
        mac.update(body.as_bytes());
        format!("{}.{}", body, URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }
}

/// Envelope bodies for wiremock responses.
pub struct MockApiResponses;

impl MockApiResponses {
    pub fn ok(data: serde_json::Value) -> serde_json::Value {
        json!({
            "success": true,
            "data": data
        })
    }

    pub fn ok_message(message: &str) -> serde_json::Value {
        json!({
            "success": true,
            "message": message
        })
    }

    pub fn failure(message: &str) -> serde_json::Value {
        json!({
            "success": false,
            "message": "Request failed",
            "error": message
        })
    }

    pub fn validation_failure(field: &str, message: &str) -> serde_json::Value {
        json!({
            "success": false,
            "message": "Validation failed",
            "errors": { field: message }
        })
    }

    pub fn html_error_page() -> &'static str {
        "<!DOCTYPE html><html><body><h1>502 Bad Gateway</h1></body></html>"
    }
}
