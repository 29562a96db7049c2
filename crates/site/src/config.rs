//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SITE_BASE_URL` - Public URL for the site (used for OAuth redirects)
//! - `SITE_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//! - `GOOGLE_CLIENT_ID` - Google OAuth client ID
//! - `GOOGLE_CLIENT_SECRET` - Google OAuth client secret
//! - `ADMIN_EMAILS` - Comma-separated admin allow-list
//!
//! ## Optional
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 3000)
//! - `GOOGLE_MAPS_API_KEY` - Browser maps key served by `/api/maps/config`
//! - `GOOGLE_PLACES_API_KEY` - Server-side Places key (falls back to the maps key)
//! - `STORAGE_URL`, `STORAGE_BUCKET`, `STORAGE_SERVICE_KEY` - Image storage (all three or none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use nearby_core::AdminAllowList;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Variables that must be present for the site to start.
pub const REQUIRED_ENV_VARS: &[&str] = &[
    "DATABASE_URL",
    "SITE_BASE_URL",
    "SITE_SESSION_SECRET",
    "GOOGLE_CLIENT_ID",
    "GOOGLE_CLIENT_SECRET",
    "ADMIN_EMAILS",
];

/// Variables that enable optional features.
pub const OPTIONAL_ENV_VARS: &[&str] = &[
    "GOOGLE_MAPS_API_KEY",
    "GOOGLE_PLACES_API_KEY",
    "STORAGE_URL",
    "STORAGE_BUCKET",
    "STORAGE_SERVICE_KEY",
    "SENTRY_DSN",
];

/// Whether each known variable is set to a non-blank value.
///
/// Reports presence only; values are never read out.
#[must_use]
pub fn env_presence() -> Vec<(&'static str, bool)> {
    REQUIRED_ENV_VARS
        .iter()
        .chain(OPTIONAL_ENV_VARS)
        .map(|&key| (key, get_optional_env(key).is_some()))
        .collect()
}

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site, without a trailing slash
    pub base_url: String,
    /// Session secret
    pub session_secret: SecretString,
    /// Google OAuth and Maps configuration
    pub google: GoogleConfig,
    /// Object storage for listing images
    pub storage: Option<StorageConfig>,
    /// Admin e-mail allow-list
    pub admins: AdminAllowList,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Log output format
    pub log_format: LogFormat,
}

/// Google OAuth, Maps, and Places configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Browser-side Maps JavaScript API key (exposed to clients on purpose)
    pub maps_api_key: Option<String>,
    /// Server-side Places API key
    pub places_api_key: Option<SecretString>,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("maps_api_key", &self.maps_api_key.as_ref().map(|_| "[SET]"))
            .field(
                "places_api_key",
                &self.places_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Object storage configuration for listing images.
///
/// Implements `Debug` manually to redact the service key.
#[derive(Clone)]
pub struct StorageConfig {
    /// Storage REST endpoint (e.g., `https://project.supabase.co/storage/v1`)
    pub url: String,
    /// Bucket holding listing images
    pub bucket: String,
    /// Service key with write access to the bucket
    pub service_key: SecretString,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("bucket", &self.bucket)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("SITE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SITE_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SITE_PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url(&get_required_env("SITE_BASE_URL")?)?;
        let session_secret = get_validated_secret("SITE_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "SITE_SESSION_SECRET")?;

        let google = GoogleConfig::from_env()?;
        let storage = StorageConfig::from_env()?;
        let admins = AdminAllowList::parse(&get_required_env("ADMIN_EMAILS")?)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_EMAILS".to_string(), e.to_string()))?;
        if admins.is_empty() {
            tracing::warn!("ADMIN_EMAILS is empty; nobody can sign in as an admin");
        }

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let log_format = LogFormat::parse(get_optional_env("LOG_FORMAT").as_deref());

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            google,
            storage,
            admins,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// OAuth redirect URI registered with Google.
    #[must_use]
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }
}

impl GoogleConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let maps_api_key = get_optional_env("GOOGLE_MAPS_API_KEY");
        let places_api_key = get_optional_env("GOOGLE_PLACES_API_KEY")
            .or_else(|| maps_api_key.clone())
            .map(SecretString::from);

        Ok(Self {
            client_id: get_required_env("GOOGLE_CLIENT_ID")?,
            client_secret: get_validated_secret("GOOGLE_CLIENT_SECRET")?,
            maps_api_key,
            places_api_key,
        })
    }
}

impl StorageConfig {
    /// All three storage variables, or none of them.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = get_optional_env("STORAGE_URL");
        let bucket = get_optional_env("STORAGE_BUCKET");
        let service_key = get_optional_env("STORAGE_SERVICE_KEY");

        match (url, bucket, service_key) {
            (None, None, None) => Ok(None),
            (Some(url), Some(bucket), Some(service_key)) => Ok(Some(Self {
                url: url.trim_end_matches('/').to_string(),
                bucket,
                service_key: SecretString::from(service_key),
            })),
            (url, bucket, _) => {
                let missing = if url.is_none() {
                    "STORAGE_URL"
                } else if bucket.is_none() {
                    "STORAGE_BUCKET"
                } else {
                    "STORAGE_SERVICE_KEY"
                };
                Err(ConfigError::MissingEnvVar(missing.to_string()))
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate the base URL and strip any trailing slash.
fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("SITE_BASE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SITE_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-client-secret-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_parse_base_url_strips_trailing_slash() {
        assert_eq!(
            parse_base_url("https://nearby.test/").unwrap(),
            "https://nearby.test"
        );
        assert!(parse_base_url("ftp://nearby.test").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
    }

    #[test]
    fn test_google_config_debug_redacts_secrets() {
        let config = GoogleConfig {
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_client_secret"),
            maps_api_key: Some("maps_key_value".to_string()),
            places_api_key: Some(SecretString::from("super_secret_places_key")),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_client_secret"));
        assert!(!debug_output.contains("super_secret_places_key"));
        assert!(!debug_output.contains("maps_key_value"));
    }

    #[test]
    fn test_env_presence_lists_every_known_variable() {
        let presence = env_presence();
        assert_eq!(
            presence.len(),
            REQUIRED_ENV_VARS.len() + OPTIONAL_ENV_VARS.len()
        );
        assert!(presence.iter().any(|(key, _)| *key == "ADMIN_EMAILS"));
    }

    #[test]
    fn test_storage_config_debug_redacts_key() {
        let config = StorageConfig {
            url: "https://storage.test/storage/v1".to_string(),
            bucket: "listing-images".to_string(),
            service_key: SecretString::from("service_role_key_value"),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("listing-images"));
        assert!(!debug_output.contains("service_role_key_value"));
    }
}
