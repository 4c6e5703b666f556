//! autoinvest — entry point.
//!
//! Loads configuration, initialises structured logging, bootstraps each
//! configured account, and runs the investment loops until every account
//! is done or the run deadline passes.

use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use autoinvest::config::AppConfig;
use autoinvest::engine::scheduler::{RunReport, Scheduler};
use autoinvest::marketplace::lending_club::LendingClubClient;
use autoinvest::marketplace::LendingMarketplace;
use autoinvest::setup;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_default()?;

    init_logging();

    info!(
        accounts = cfg.accounts.len(),
        deadline_secs = cfg.run.deadline_secs,
        quiescence_ms = cfg.run.quiescence_ms,
        "autoinvest starting up"
    );

    let client = LendingClubClient::new(
        cfg.marketplace.base_url.clone(),
        cfg.marketplace.timeout_secs.map(Duration::from_secs),
    )?;
    let marketplace: Arc<dyn LendingMarketplace> = Arc::new(client);

    let accounts = setup::bootstrap_all(&cfg, marketplace.as_ref()).await;
    if accounts.is_empty() {
        warn!("No accounts ready to invest, exiting");
        return Ok(());
    }

    let scheduler = Scheduler::new(marketplace, cfg.run.settings());
    let report = scheduler.run(accounts).await;
    log_run_report(&report);

    Ok(())
}

/// Log one line per account outcome.
fn log_run_report(report: &RunReport) {
    for outcome in &report.outcomes {
        if outcome.is_failure() {
            warn!(
                account = %outcome.account_id,
                reason = %outcome.reason,
                cycles = outcome.cycles,
                purchased = outcome.loans_purchased.len(),
                cash = %format_cash(outcome.cash_remaining),
                "Account finished with error"
            );
        } else {
            info!(
                account = %outcome.account_id,
                reason = %outcome.reason,
                cycles = outcome.cycles,
                purchased = outcome.loans_purchased.len(),
                cash = %format_cash(outcome.cash_remaining),
                "Account finished"
            );
        }
    }
}

fn format_cash(cash: Option<Decimal>) -> String {
    cash.map_or_else(|| "unknown".to_string(), |c| format!("${c:.2}"))
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("autoinvest=info"));

    let json_logging = std::env::var("AUTOINVEST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
