//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Payment ledger tuning.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Report defaults.
    #[serde(default)]
    pub reports: ReportConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Payment ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many days after its payment date a payment may still be reversed.
    #[serde(default = "default_reversal_window_days")]
    pub reversal_window_days: i64,
    /// Prefix of generated receipt numbers.
    #[serde(default = "default_receipt_prefix")]
    pub receipt_prefix: String,
    /// Upper bound for a single ledger unit of work.
    #[serde(default = "default_unit_of_work_timeout_ms")]
    pub unit_of_work_timeout_ms: u64,
    /// Postgres `lock_timeout` applied inside ledger transactions.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_reversal_window_days() -> i64 {
    30
}

fn default_receipt_prefix() -> String {
    "RCP".to_string()
}

fn default_unit_of_work_timeout_ms() -> u64 {
    10_000
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reversal_window_days: default_reversal_window_days(),
            receipt_prefix: default_receipt_prefix(),
            unit_of_work_timeout_ms: default_unit_of_work_timeout_ms(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Outstanding amount threshold used when a defaulter query omits one.
    #[serde(default)]
    pub default_defaulter_threshold: rust_decimal::Decimal,
    /// Number of fee categories listed in payment analysis.
    #[serde(default = "default_top_categories_limit")]
    pub top_categories_limit: usize,
}

fn default_top_categories_limit() -> usize {
    10
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_defaulter_threshold: rust_decimal::Decimal::ZERO,
            top_categories_limit: default_top_categories_limit(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("BURSAR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.reversal_window_days, 30);
        assert_eq!(ledger.receipt_prefix, "RCP");
        assert_eq!(ledger.unit_of_work_timeout_ms, 10_000);
        assert_eq!(ledger.lock_timeout_ms, 5_000);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("BURSAR__DATABASE__URL", Some("postgres://localhost/bursar")),
                ("BURSAR__JWT__SECRET", Some("test-secret")),
                ("BURSAR__LEDGER__RECEIPT_PREFIX", Some("SCH")),
                ("RUN_MODE", Some("bursar-config-test")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/bursar");
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.ledger.receipt_prefix, "SCH");
                assert_eq!(config.ledger.reversal_window_days, 30);
                assert_eq!(config.reports.top_categories_limit, 10);
            },
        );
    }
}
