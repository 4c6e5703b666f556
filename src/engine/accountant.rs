//! Accountant — applies an order confirmation to account state.
//!
//! The only place an account's cash or owned set changes. Cash is debited
//! after confirmation, never ahead of it.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::account::Account;
use crate::types::OrderConfirmation;

// ---------------------------------------------------------------------------
// Purchase report
// ---------------------------------------------------------------------------

/// Outcome of reconciling one confirmation.
#[derive(Debug, Clone)]
pub struct PurchaseReport {
    pub purchased: Vec<u64>,
    pub rejected: Vec<u64>,
    pub debited: Decimal,
    pub cash_before: Decimal,
    pub cash_after: Decimal,
    pub timestamp: chrono::DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

pub struct Accountant;

impl Accountant {
    /// Record purchased notes and debit cash.
    ///
    /// A line counts as purchased when its invested amount is present and
    /// non-negative. The debit is `amount_per_loan × purchased`, one
    /// aggregate charge for the whole confirmation.
    pub fn reconcile(account: &mut Account, confirmation: &OrderConfirmation) -> PurchaseReport {
        let cash_before = account.available_cash;
        let mut purchased = Vec::new();
        let mut rejected = Vec::new();

        for line in &confirmation.order_confirmations {
            if !line.is_purchased() {
                warn!(
                    loan_id = line.loan_id,
                    invested = ?line.invested_amount,
                    status = ?line.execution_status,
                    "Order line rejected"
                );
                rejected.push(line.loan_id);
                continue;
            }

            if line.invested_amount != Some(account.amount_per_loan) {
                warn!(
                    loan_id = line.loan_id,
                    invested = ?line.invested_amount,
                    requested = %account.amount_per_loan,
                    "Partial fill, debiting the full per-loan amount"
                );
            }

            account.owned_loan_ids.insert(line.loan_id);
            purchased.push(line.loan_id);
        }

        let debited = account.amount_per_loan * Decimal::from(purchased.len());
        account.available_cash -= debited;

        let report = PurchaseReport {
            purchased,
            rejected,
            debited,
            cash_before,
            cash_after: account.available_cash,
            timestamp: Utc::now(),
        };

        info!(
            account = %account.id,
            purchased = report.purchased.len(),
            rejected = report.rejected.len(),
            debited = format!("${:.2}", report.debited),
            cash = format!("${:.2}", report.cash_after),
            "Order reconciled"
        );

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
