//! Account bootstrap.
//!
//! Builds a ready-to-run `Account` from its config entry: resolves the
//! authorization token, pulls the account summary and currently held notes
//! from the marketplace, and works out the state allow-list.

pub mod allowed_states;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::account::{Account, InvestmentCriteria};
use crate::config::{AccountConfig, AppConfig, FilterConfig};
use crate::marketplace::LendingMarketplace;

/// Resolve the account's token from its env var, or failing that its file.
pub fn resolve_token(cfg: &AccountConfig) -> Result<SecretString> {
    if let Some(env) = &cfg.token_env {
        match AppConfig::resolve_env(env) {
            Ok(token) => return Ok(SecretString::new(token.trim().to_string())),
            Err(e) if cfg.token_file.is_none() => return Err(e),
            Err(_) => {}
        }
    }

    let path = cfg
        .token_file
        .as_deref()
        .with_context(|| format!("account {}: no token source configured", cfg.name))?;
    read_token_file(path)
}

fn read_token_file(path: &Path) -> Result<SecretString> {
    let token = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read token file: {}", path.display()))?;
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token file is empty: {}", path.display());
    }
    Ok(SecretString::new(token.to_string()))
}

/// Combine the shared filter policy with per-account grades and states.
pub fn criteria(filter: &FilterConfig, grades: &[String], states: Vec<String>) -> InvestmentCriteria {
    InvestmentCriteria {
        min_annual_income: filter.min_annual_income,
        allowed_purposes: filter.allowed_purposes.iter().cloned().collect(),
        allowed_grades: grades.iter().cloned().collect(),
        allowed_states: states.into_iter().collect(),
        required_term: filter.required_term,
        min_interest_rate: filter.min_interest_rate,
        max_inquiries_last_6_mths: filter.max_inquiries_last_6_mths,
        revol_balance_band: filter.revol_balance_band,
    }
}

/// Bootstrap one account against the marketplace.
pub async fn bootstrap_account(
    cfg: &AccountConfig,
    filter: &FilterConfig,
    marketplace: &dyn LendingMarketplace,
) -> Result<Account> {
    let token = resolve_token(cfg)?;
    let token_str = token.expose_secret().as_str();

    let summary = marketplace
        .account_summary(&cfg.investor_id, token_str)
        .await
        .with_context(|| format!("Failed to fetch summary for account {}", cfg.name))?;

    let states = match (&cfg.allowed_states, &cfg.notes_csv) {
        (Some(states), _) => states.clone(),
        (None, Some(path)) => allowed_states::from_csv_path(
            path,
            cfg.state_percent_limit,
            summary.account_total,
        )?,
        (None, None) => allowed_states::all_states(),
    };

    let owned: HashSet<u64> = marketplace
        .owned_loan_ids(&cfg.investor_id, token_str)
        .await
        .with_context(|| format!("Failed to fetch owned notes for account {}", cfg.name))?
        .into_iter()
        .collect();

    let account = Account::new(
        cfg.investor_id.clone(),
        cfg.name.clone(),
        token,
        summary.available_cash,
        cfg.amount_per_loan,
        criteria(filter, &cfg.allowed_grades, states),
        owned,
    );

    info!(
        account = %cfg.name,
        cash = format!("${:.2}", account.available_cash),
        total = format!("${:.2}", summary.account_total),
        owned = account.owned_loan_ids.len(),
        states = account.criteria.allowed_states.len(),
        target = account.target_count,
        "Account ready"
    );

    Ok(account)
}

/// Bootstrap every configured account. An account that fails to bootstrap
/// is logged and left out; the rest still run.
pub async fn bootstrap_all(config: &AppConfig, marketplace: &dyn LendingMarketplace) -> Vec<Account> {
    let mut accounts = Vec::with_capacity(config.accounts.len());
    for cfg in &config.accounts {
        match bootstrap_account(cfg, &config.filter, marketplace).await {
            Ok(account) => accounts.push(account),
            Err(e) => warn!(account = %cfg.name, error = format!("{e:#}"), "Account setup failed, skipping"),
        }
    }
    accounts
}
