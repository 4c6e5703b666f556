//! Account investment loop.
//!
//! Drives one account through repeated poll → filter → order → reconcile
//! cycles until its cash runs out, the run deadline passes, or a request
//! fails. The account is owned exclusively by the task running this loop.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::account::Account;
use crate::engine::accountant::{Accountant, PurchaseReport};
use crate::engine::order::build_order;
use crate::engine::scheduler::Deadline;
use crate::marketplace::LendingMarketplace;
use crate::strategy::filter;
use crate::types::InvestError;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a single cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Nothing passed the filter; no order was submitted.
    NoMatch { listings: usize },
    Purchased(PurchaseReport),
}

/// Why an account's loop reached `Done`.
#[derive(Debug)]
pub enum StopReason {
    InsufficientCash,
    DeadlineExceeded,
    Failed(InvestError),
    /// The account task panicked or was cancelled.
    Aborted(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::InsufficientCash => write!(f, "insufficient cash"),
            StopReason::DeadlineExceeded => write!(f, "deadline exceeded"),
            StopReason::Failed(e) => write!(f, "failed: {e}"),
            StopReason::Aborted(msg) => write!(f, "aborted: {msg}"),
        }
    }
}

/// Terminal summary for one account.
#[derive(Debug)]
pub struct AccountOutcome {
    pub account_id: String,
    pub reason: StopReason,
    pub cycles: u64,
    pub loans_purchased: Vec<u64>,
    /// `None` when the account's task died before reporting back.
    pub cash_remaining: Option<Decimal>,
    pub finished_at: DateTime<Utc>,
}

impl AccountOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.reason, StopReason::Failed(_) | StopReason::Aborted(_))
    }
}

// ---------------------------------------------------------------------------
// Investor
// ---------------------------------------------------------------------------

pub struct Investor<'a> {
    marketplace: &'a dyn LendingMarketplace,
    deadline: Deadline,
    quiescence: Duration,
}

impl<'a> Investor<'a> {
    pub fn new(
        marketplace: &'a dyn LendingMarketplace,
        deadline: Deadline,
        quiescence: Duration,
    ) -> Self {
        Self {
            marketplace,
            deadline,
            quiescence,
        }
    }

    /// Run the loop to completion for `account`.
    ///
    /// The deadline is checked at the top of every iteration only; a request
    /// in flight when it passes is allowed to finish.
    pub async fn run(&self, account: &mut Account) -> AccountOutcome {
        let mut cycles = 0u64;
        let mut purchased = Vec::new();

        if !account.can_invest() {
            info!(
                cash = %account.available_cash,
                per_loan = %account.amount_per_loan,
                "Not enough cash for a single note, skipping account"
            );
            return Self::finish(account, StopReason::InsufficientCash, cycles, purchased);
        }

        info!(
            cash = format!("${:.2}", account.available_cash),
            per_loan = format!("${:.2}", account.amount_per_loan),
            target = account.target_count,
            owned = account.owned_loan_ids.len(),
            "Investment loop starting"
        );

        let reason = loop {
            if self.deadline.is_expired() {
                break StopReason::DeadlineExceeded;
            }
            if !account.can_invest() {
                break StopReason::InsufficientCash;
            }

            cycles += 1;
            match self.run_cycle(account).await {
                Ok(CycleOutcome::NoMatch { listings }) => {
                    debug!(cycle = cycles, listings, "No eligible loans, backing off");
                    tokio::time::sleep(self.quiescence).await;
                }
                Ok(CycleOutcome::Purchased(report)) => {
                    purchased.extend_from_slice(&report.purchased);
                }
                Err(e) => {
                    error!(cycle = cycles, error = %e, "Investment loop terminated");
                    break StopReason::Failed(e);
                }
            }
        };

        Self::finish(account, reason, cycles, purchased)
    }

    /// One poll → filter → order → reconcile pass.
    pub async fn run_cycle(&self, account: &mut Account) -> Result<CycleOutcome, InvestError> {
        let show_all = account.is_first_fetch;
        let listings = self
            .marketplace
            .fetch_listings(show_all, account.token())
            .await?;
        account.is_first_fetch = false;

        let selected = filter::select(&listings, account);
        if selected.is_empty() {
            return Ok(CycleOutcome::NoMatch {
                listings: listings.len(),
            });
        }

        debug!(
            listings = listings.len(),
            selected = selected.len(),
            top_rate = %selected[0].int_rate,
            "Loans selected"
        );

        let order = build_order(&selected, account.amount_per_loan, &account.id)?;
        let confirmation = self
            .marketplace
            .submit_order(&order, account.token())
            .await?;

        Ok(CycleOutcome::Purchased(Accountant::reconcile(
            account,
            &confirmation,
        )))
    }

    fn finish(
        account: &Account,
        reason: StopReason,
        cycles: u64,
        loans_purchased: Vec<u64>,
    ) -> AccountOutcome {
        info!(
            reason = %reason,
            cycles,
            purchased = loans_purchased.len(),
            cash = format!("${:.2}", account.available_cash),
            "Investment loop done"
        );

        AccountOutcome {
            account_id: account.id.clone(),
            reason,
            cycles,
            loans_purchased,
            cash_remaining: Some(account.available_cash),
            finished_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
