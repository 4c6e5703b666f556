//! Multi-account scheduler.
//!
//! Spawns one investment loop per account, all sharing a single wall-clock
//! deadline started before any account launches, and waits for every loop
//! to reach `Done`. Accounts never communicate; a failure in one does not
//! affect the others.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::account::Account;
use crate::engine::investor::{AccountOutcome, Investor, StopReason};
use crate::marketplace::LendingMarketplace;

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// Run deadline measured on the monotonic clock. Read-only once started.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.limit
    }
}

// ---------------------------------------------------------------------------
// Run settings and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// Wall-clock budget for the whole run.
    pub deadline: Duration,
    /// Pause after a cycle that found nothing to buy.
    pub quiescence: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(120),
            quiescence: Duration::from_secs(1),
        }
    }
}

/// Union of every account's terminal state.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcomes: Vec<AccountOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn outcome(&self, account_id: &str) -> Option<&AccountOutcome> {
        self.outcomes.iter().find(|o| o.account_id == account_id)
    }

    pub fn loans_purchased(&self) -> usize {
        self.outcomes.iter().map(|o| o.loans_purchased.len()).sum()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct Scheduler {
    marketplace: Arc<dyn LendingMarketplace>,
    settings: RunSettings,
}

impl Scheduler {
    pub fn new(marketplace: Arc<dyn LendingMarketplace>, settings: RunSettings) -> Self {
        Self {
            marketplace,
            settings,
        }
    }

    /// Run every account to completion and collect their outcomes, in the
    /// order the accounts were given.
    pub async fn run(&self, accounts: Vec<Account>) -> RunReport {
        let run_id = Uuid::new_v4();
        let deadline = Deadline::start(self.settings.deadline);

        info!(
            %run_id,
            accounts = accounts.len(),
            deadline_secs = self.settings.deadline.as_secs_f64(),
            "Run starting"
        );

        let (ids, handles): (Vec<_>, Vec<_>) = accounts
            .into_iter()
            .map(|mut account| {
                let marketplace = Arc::clone(&self.marketplace);
                let quiescence = self.settings.quiescence;
                let span = info_span!("account", %run_id, id = %account.id, name = %account.name);
                let id = account.id.clone();

                let handle = tokio::spawn(
                    async move {
                        let investor = Investor::new(marketplace.as_ref(), deadline, quiescence);
                        investor.run(&mut account).await
                    }
                    .instrument(span),
                );
                (id, handle)
            })
            .unzip();

        let outcomes = ids
            .into_iter()
            .zip(join_all(handles).await)
            .map(|(account_id, joined)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(account = %account_id, error = %e, "Account task aborted");
                    AccountOutcome {
                        account_id,
                        reason: StopReason::Aborted(e.to_string()),
                        cycles: 0,
                        loans_purchased: Vec::new(),
                        cash_remaining: None,
                        finished_at: chrono::Utc::now(),
                    }
                }
            })
            .collect();

        let report = RunReport {
            run_id,
            outcomes,
            elapsed: deadline.elapsed(),
        };

        info!(
            %run_id,
            purchased = report.loans_purchased(),
            failures = report.failures(),
            elapsed_secs = report.elapsed.as_secs_f64(),
            "Run complete"
        );

        report
    }
}
