//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::money::DEFAULT_TOLERANCE;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Projection defaults.
    #[serde(default)]
    pub projection: ProjectionConfig,
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

/// Where a box's balance starts before any movement is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxInitialBalance {
    /// Boxes always start at zero.
    #[default]
    Zero,
    /// Boxes start at their recorded initial value.
    Funded,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Baseline used for box balances by reconciliation and purge.
    #[serde(default)]
    pub box_initial_balance: BoxInitialBalance,
    /// Largest accepted gap between a cached balance and the ledger sum.
    #[serde(default = "default_tolerance", with = "rust_decimal::serde::str")]
    pub reconciliation_tolerance: Decimal,
}

fn default_tolerance() -> Decimal {
    DEFAULT_TOLERANCE
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            box_initial_balance: BoxInitialBalance::default(),
            reconciliation_tolerance: default_tolerance(),
        }
    }
}

/// Projection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectionConfig {
    /// Number of months projected when the caller does not say.
    #[serde(default = "default_months_ahead")]
    pub months_ahead: u32,
}

fn default_months_ahead() -> u32 {
    12
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            months_ahead: default_months_ahead(),
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
            .add_source(config::Environment::with_prefix("MONEYBOX").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
