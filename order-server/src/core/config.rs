//! Server configuration
//!
//! Every item can be overridden through environment variables:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | HTTP_PORT | 3000 | HTTP API port |
//! | DATABASE_PATH | ./data/orders.db | SQLite database file |
//! | LOG_LEVEL | info | tracing level filter |
//! | LOG_DIR | (unset) | daily rolling log files when set |
//! | ENVIRONMENT | development | development \| staging \| production |
//! | CURRENCY | EUR | charge currency passed to providers |
//! | GATEWAY_TIMEOUT_MS | 30000 | per-call payment provider timeout |
//! | CARD_BASE_URL | http://localhost:9401 | card processor base URL |
//! | CARD_API_KEY | (empty) | card processor API key |
//! | MOMO_BASE_URL | http://localhost:9402 | mobile money base URL |
//! | MOMO_API_USER | (empty) | mobile money API user |
//! | MOMO_API_KEY | (empty) | mobile money API key |
//! | MOMO_TARGET_ENV | sandbox | mobile money target environment |

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_path: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub environment: String,
    /// Currency code sent with every charge
    pub currency: String,
    /// Upper bound on any single payment-provider call
    pub gateway_timeout_ms: u64,

    // Card processor
    pub card_base_url: String,
    pub card_api_key: String,

    // Mobile money provider
    pub momo_base_url: String,
    pub momo_api_user: String,
    pub momo_api_key: String,
    pub momo_target_env: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: env_or("DATABASE_PATH", "./data/orders.db"),
            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: env_or("ENVIRONMENT", "development"),
            currency: env_or("CURRENCY", "EUR"),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            card_base_url: env_or("CARD_BASE_URL", "http://localhost:9401"),
            card_api_key: env_or("CARD_API_KEY", ""),
            momo_base_url: env_or("MOMO_BASE_URL", "http://localhost:9402"),
            momo_api_user: env_or("MOMO_API_USER", ""),
            momo_api_key: env_or("MOMO_API_KEY", ""),
            momo_target_env: env_or("MOMO_TARGET_ENV", "sandbox"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
