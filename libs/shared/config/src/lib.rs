use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_ROLE: &str = "doctor";
pub const DEFAULT_REFRESH_SECONDS: u64 = 30;
pub const DEFAULT_QR_SCAN_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub default_role: String,
    pub http_timeout_seconds: u64,
    pub queue_refresh_seconds: u64,
    pub chat_refresh_seconds: u64,
    pub qr_scan_interval_ms: u64,
    pub session_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            default_role: DEFAULT_ROLE.to_string(),
            http_timeout_seconds: 30,
            queue_refresh_seconds: DEFAULT_REFRESH_SECONDS,
            chat_refresh_seconds: DEFAULT_REFRESH_SECONDS,
            qr_scan_interval_ms: DEFAULT_QR_SCAN_INTERVAL_MS,
            session_file: PathBuf::from(".hospital-desk/session.json"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: env::var("HOSPITAL_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_API_URL not set, using {}", DEFAULT_API_URL);
                    defaults.api_base_url.clone()
                }),
            default_role: env::var("HOSPITAL_ROLE")
                .unwrap_or_else(|_| {
                    warn!("HOSPITAL_ROLE not set, using {}", DEFAULT_ROLE);
                    defaults.default_role.clone()
                }),
            http_timeout_seconds: read_u64("HOSPITAL_HTTP_TIMEOUT_SECONDS", defaults.http_timeout_seconds),
            queue_refresh_seconds: read_u64("QUEUE_REFRESH_SECONDS", defaults.queue_refresh_seconds),
            chat_refresh_seconds: read_u64("CHAT_REFRESH_SECONDS", defaults.chat_refresh_seconds),
            qr_scan_interval_ms: read_u64("QR_SCAN_INTERVAL_MS", defaults.qr_scan_interval_ms),
            session_file: env::var("HOSPITAL_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - check HOSPITAL_* environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
            && !self.default_role.is_empty()
            && self.queue_refresh_seconds > 0
            && self.chat_refresh_seconds > 0
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn queue_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.queue_refresh_seconds)
    }

    pub fn chat_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.chat_refresh_seconds)
    }

    pub fn qr_scan_interval(&self) -> Duration {
        Duration::from_millis(self.qr_scan_interval_ms)
    }
}

fn read_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number ({}), using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page_cadence() {
        let config = AppConfig::default();

        assert!(config.is_configured());
        assert_eq!(config.queue_refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.chat_refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.qr_scan_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn test_zero_interval_is_not_configured() {
        let config = AppConfig {
            queue_refresh_seconds: 0,
            ..AppConfig::default()
        };

        assert!(!config.is_configured());
    }
}
