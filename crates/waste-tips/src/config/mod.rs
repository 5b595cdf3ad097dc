use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::google::recaptcha::DEFAULT_RECAPTCHA_ENDPOINT;

const DEFAULT_MAX_REQUEST_BYTES: usize = 10 << 20;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub google: GoogleConfig,
    pub limits: RequestLimits,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = first_present(&["APP_PORT", "PORT"])
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let gcp_enabled = match first_present(&["GCP_ENABLED"]) {
            Some(raw) => parse_flag("GCP_ENABLED", &raw)?,
            None => environment == AppEnvironment::Production,
        };
        let application_name =
            first_present(&["APPLICATION_NAME"]).unwrap_or_else(|| "Waste Tips".to_string());

        let project_id = first_present(&["PROJECT_ID", "GOOGLE_CLOUD_PROJECT"])
            .unwrap_or_else(|| "waste-tips".to_string());
        let location =
            first_present(&["GEMINI_LOCATION"]).unwrap_or_else(|| "europe-west4".to_string());
        let gemini_endpoint = first_present(&["GEMINI_ENDPOINT"])
            .unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com"));

        let google = GoogleConfig {
            project_id,
            recaptcha_site_key: env::var("RECAPTCHA_SITE_KEY").unwrap_or_default(),
            recaptcha_api_key: first_present(&["RECAPTCHA_API_KEY"]),
            recaptcha_endpoint: first_present(&["RECAPTCHA_ENDPOINT"])
                .unwrap_or_else(|| DEFAULT_RECAPTCHA_ENDPOINT.to_string()),
            gemini_location: location,
            gemini_model: first_present(&["GEMINI_MODEL"])
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            gemini_endpoint,
            access_token: first_present(&["GOOGLE_ACCESS_TOKEN"]),
        };

        let request_timeout = match first_present(&["REQUEST_TIMEOUT_SECS"]) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "REQUEST_TIMEOUT_SECS",
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let max_request_bytes = match first_present(&["MAX_REQUEST_BYTES"]) {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|bytes| *bytes > 0)
                .ok_or(ConfigError::InvalidNumber {
                    key: "MAX_REQUEST_BYTES",
                })?,
            None => DEFAULT_MAX_REQUEST_BYTES,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                gcp_enabled,
                application_name,
                project_id: google.project_id.clone(),
            },
            google,
            limits: RequestLimits {
                max_request_bytes,
                request_timeout: Duration::from_secs(request_timeout),
            },
        })
    }
}

fn first_present(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { key }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Emit JSON lines that Cloud Logging ingests as structured payloads.
    pub gcp_enabled: bool,
    pub application_name: String,
    /// Project that trace ids in structured log entries belong to.
    pub project_id: String,
}

/// Google Cloud project and the two upstream services the pipeline calls.
#[derive(Clone)]
pub struct GoogleConfig {
    pub project_id: String,
    pub recaptcha_site_key: String,
    pub recaptcha_api_key: Option<String>,
    pub recaptcha_endpoint: String,
    pub gemini_location: String,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub access_token: Option<String>,
}

impl GoogleConfig {
    /// Fails when a value the gateways cannot run without is blank.
    pub fn require_complete(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingSetting { key: "PROJECT_ID" });
        }
        if self.recaptcha_site_key.trim().is_empty() {
            return Err(ConfigError::MissingSetting {
                key: "RECAPTCHA_SITE_KEY",
            });
        }
        Ok(())
    }
}

impl fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("project_id", &self.project_id)
            .field("recaptcha_site_key", &self.recaptcha_site_key)
            .field(
                "recaptcha_api_key",
                &self.recaptcha_api_key.as_ref().map(|_| "***"),
            )
            .field("recaptcha_endpoint", &self.recaptcha_endpoint)
            .field("gemini_location", &self.gemini_location)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_endpoint", &self.gemini_endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Per-request bounds applied at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_request_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    InvalidFlag { key: &'static str },
    MissingSetting { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a positive integer")
            }
            ConfigError::InvalidFlag { key } => write!(f, "{key} must be true or false"),
            ConfigError::MissingSetting { key } => write!(f, "{key} must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
