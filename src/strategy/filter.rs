//! Loan eligibility filter and ranking.
//!
//! Pure functions only: given a listing batch and an account, decide which
//! loans are worth buying this cycle and in what order.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use tracing::debug;

use crate::account::{Account, InvestmentCriteria};
use crate::types::Loan;

/// Why a listing was passed over. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    Income,
    Purpose,
    Inquiries,
    InterestRate,
    Term,
    Grade,
    Delinquency,
    RevolvingBalance,
    State,
    AlreadyOwned,
}

/// Check one loan against the account's criteria and owned set.
pub fn check(loan: &Loan, account: &Account) -> Result<(), Ineligible> {
    let c: &InvestmentCriteria = &account.criteria;

    if loan.annual_inc < c.min_annual_income {
        return Err(Ineligible::Income);
    }
    if !c.allowed_purposes.contains(&loan.purpose) {
        return Err(Ineligible::Purpose);
    }
    if loan.inq_last6_mths > c.max_inquiries_last_6_mths {
        return Err(Ineligible::Inquiries);
    }
    if loan.int_rate < c.min_interest_rate {
        return Err(Ineligible::InterestRate);
    }
    if loan.term != c.required_term {
        return Err(Ineligible::Term);
    }
    if !c.allowed_grades.contains(&loan.grade) {
        return Err(Ineligible::Grade);
    }
    if loan.mths_since_last_delinq.is_some() {
        return Err(Ineligible::Delinquency);
    }
    if !within_revolving_band(loan, c.revol_balance_band) {
        return Err(Ineligible::RevolvingBalance);
    }
    if !c.allowed_states.contains(&loan.addr_state) {
        return Err(Ineligible::State);
    }
    if account.owned_loan_ids.contains(&loan.id) {
        return Err(Ineligible::AlreadyOwned);
    }
    Ok(())
}

/// `(1 - band) × revolBal ≤ loanAmount ≤ (1 + band) × revolBal`
fn within_revolving_band(loan: &Loan, band: Decimal) -> bool {
    let lower = (dec!(1) - band) * loan.revol_bal;
    let upper = (dec!(1) + band) * loan.revol_bal;
    loan.loan_amount >= lower && loan.loan_amount <= upper
}

/// Select the loans to order this cycle.
///
/// Eligible loans are ranked by interest rate, highest first; equal rates
/// keep their listing order. A loan id repeated within the batch is taken
/// once. The result is capped at the number of notes
/// the account's current cash can pay for. An empty result means nothing
/// to buy this cycle.
pub fn select(candidates: &[Loan], account: &Account) -> Vec<Loan> {
    let cap = account.cycle_cap();
    if cap == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut eligible: Vec<&Loan> = candidates
        .iter()
        .filter(|loan| match check(loan, account) {
            Ok(()) => true,
            Err(reason) => {
                debug!(loan_id = loan.id, reason = ?reason, "Loan filtered out");
                false
            }
        })
        .filter(|loan| {
            let first = seen.insert(loan.id);
            if !first {
                debug!(loan_id = loan.id, "Duplicate listing skipped");
            }
            first
        })
        .collect();

    // Vec::sort_by is stable, which gives the listing-order tie-break.
    eligible.sort_by(|a, b| b.int_rate.cmp(&a.int_rate));

    eligible.into_iter().take(cap).cloned().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
