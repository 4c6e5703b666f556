//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Authorization tokens are referenced by env-var name (or file path) in
//! the config and resolved at account setup.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::scheduler::RunSettings;

/// Env var that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "AUTOINVEST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    pub deadline_secs: u64,
    pub quiescence_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            deadline_secs: 120,
            quiescence_ms: 1000,
        }
    }
}

impl RunConfig {
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            deadline: Duration::from_secs(self.deadline_secs),
            quiescence: Duration::from_millis(self.quiescence_ms),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MarketplaceConfig {
    /// Defaults to the production investor API.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Listing eligibility policy shared by all accounts.
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    pub min_annual_income: Decimal,
    pub allowed_purposes: Vec<String>,
    pub max_inquiries_last_6_mths: u32,
    /// Interest rate floor in percent.
    pub min_interest_rate: Decimal,
    /// Term in months.
    pub required_term: u32,
    pub revol_balance_band: Decimal,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_annual_income: dec!(59900),
            allowed_purposes: vec!["debt_consolidation".into(), "credit_card".into()],
            max_inquiries_last_6_mths: 0,
            min_interest_rate: dec!(10.0),
            required_term: 36,
            revol_balance_band: dec!(0.10),
        }
    }
}

/// One investor account to run.
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub name: String,
    pub investor_id: String,
    /// Env var holding the authorization token.
    #[serde(default)]
    pub token_env: Option<String>,
    /// File holding the authorization token (used when `token_env` is unset).
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    pub amount_per_loan: Decimal,
    pub allowed_grades: Vec<String>,
    /// Explicit state allow-list. Takes precedence over `notes_csv`.
    #[serde(default)]
    pub allowed_states: Option<Vec<String>>,
    /// Notes export used to cap per-state concentration.
    #[serde(default)]
    pub notes_csv: Option<PathBuf>,
    /// Max share of account value held in any one state (0.05 = 5%).
    #[serde(default = "default_state_percent_limit")]
    pub state_percent_limit: Decimal,
}

fn default_state_percent_limit() -> Decimal {
    dec!(0.05)
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `$AUTOINVEST_CONFIG`, falling back to `config.toml`.
    pub fn load_default() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(&path)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.filter.revol_balance_band < Decimal::ZERO {
            anyhow::bail!("filter.revol_balance_band must not be negative");
        }
        for account in &self.accounts {
            if account.amount_per_loan <= Decimal::ZERO {
                anyhow::bail!("account {}: amount_per_loan must be positive", account.name);
            }
            if account.token_env.is_none() && account.token_file.is_none() {
                anyhow::bail!("account {}: set token_env or token_file", account.name);
            }
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
