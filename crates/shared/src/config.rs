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
    /// Ledger engine settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
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

/// Ledger engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound for waiting on a customer or check row lock, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Pending checks due within this many days are flagged as due soon.
    #[serde(default = "default_check_warning_days")]
    pub check_warning_days: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            check_warning_days: default_check_warning_days(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    3000
}

fn default_check_warning_days() -> u32 {
    7
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
            .add_source(config::Environment::with_prefix("CUENTAS").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_applies_defaults() {
        temp_env::with_vars(
            [
                ("CUENTAS__DATABASE__URL", Some("postgres://localhost/cuentas")),
                ("CUENTAS__SERVER__PORT", None),
                ("CUENTAS__LEDGER__LOCK_TIMEOUT_MS", None),
                ("CUENTAS__LEDGER__CHECK_WARNING_DAYS", None),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/cuentas");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 8080);
                assert_eq!(config.ledger.lock_timeout_ms, 3000);
                assert_eq!(config.ledger.check_warning_days, 7);
            },
        );
    }

    #[test]
    fn test_load_reads_ledger_overrides() {
        temp_env::with_vars(
            [
                ("CUENTAS__DATABASE__URL", Some("postgres://localhost/cuentas")),
                ("CUENTAS__LEDGER__LOCK_TIMEOUT_MS", Some("500")),
                ("CUENTAS__LEDGER__CHECK_WARNING_DAYS", Some("14")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.lock_timeout_ms, 500);
                assert_eq!(config.ledger.check_warning_days, 14);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_var_unset("CUENTAS__DATABASE__URL", || {
            assert!(AppConfig::load().is_err());
        });
    }
}
