//! Service configuration.

use std::path::PathBuf;
use std::str::FromStr;

/// Default HS256 secret. Only suitable for local development.
const DEV_JWT_SECRET: &str = "zenbali-dev-secret-change-me";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Public base URL, used to build checkout redirect URLs.
    pub base_url: String,

    /// PostgreSQL connection string. Unset runs on the in-memory store.
    pub database_url: Option<String>,

    /// Connection pool size.
    pub db_max_connections: u32,

    /// HS256 secret for bearer tokens.
    pub jwt_secret: String,

    /// Stripe secret API key (optional).
    pub stripe_secret_key: Option<String>,

    /// Stripe webhook signing secret (optional).
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL.
    pub stripe_api_base: String,

    /// Posting fee in minor currency units.
    pub posting_fee_cents: i64,

    /// Posting fee currency, e.g. "usd".
    pub currency: String,

    /// Upper bound on a single payment gateway call.
    pub gateway_timeout_seconds: u64,

    /// Maximum age of a signed webhook notification.
    pub webhook_tolerance_seconds: i64,

    /// Directory uploaded images are written to.
    pub upload_dir: PathBuf,

    /// Maximum image size in bytes.
    pub max_upload_bytes: usize,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let defaults = Self::default();

        Self {
            listen_addr: env_string("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            base_url: env_string("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            database_url: env_string("DATABASE_URL"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
            jwt_secret: env_string("JWT_SECRET").unwrap_or_else(|| {
                tracing::warn!("JWT_SECRET not set - using the development secret");
                defaults.jwt_secret
            }),
            stripe_secret_key: env_string("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: env_string("STRIPE_WEBHOOK_SECRET"),
            stripe_api_base: env_string("STRIPE_API_BASE").unwrap_or(defaults.stripe_api_base),
            posting_fee_cents: env_parse("STRIPE_PRICE_CENTS")
                .unwrap_or(defaults.posting_fee_cents),
            currency: env_string("STRIPE_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(defaults.currency),
            gateway_timeout_seconds: env_parse("GATEWAY_TIMEOUT_SECONDS")
                .unwrap_or(defaults.gateway_timeout_seconds),
            webhook_tolerance_seconds: env_parse("WEBHOOK_TOLERANCE_SECONDS")
                .unwrap_or(defaults.webhook_tolerance_seconds),
            upload_dir: env_string("UPLOAD_DIR").map_or(defaults.upload_dir, PathBuf::from),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            cors_origins: env_string("CORS_ORIGINS").map_or(defaults.cors_origins, |origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }

    /// Whether the Stripe gateway is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe_secret_key.is_some()
    }
}

/// Read a non-empty environment variable.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse an environment variable, ignoring unparseable values.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key = %key, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            base_url: "http://localhost:8080".into(),
            database_url: None,
            db_max_connections: 25,
            jwt_secret: DEV_JWT_SECRET.into(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: "https://api.stripe.com/v1".into(),
            posting_fee_cents: 1000,
            currency: "usd".into(),
            gateway_timeout_seconds: 5,
            webhook_tolerance_seconds: 300,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            cors_origins: vec!["*".into()],
            max_body_bytes: 6 * 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
