//! Investor account state owned by a single investment loop.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;
use std::fmt;

/// Eligibility criteria applied to every listing for one account.
#[derive(Debug, Clone)]
pub struct InvestmentCriteria {
    pub min_annual_income: Decimal,
    pub allowed_purposes: HashSet<String>,
    pub allowed_grades: HashSet<String>,
    pub allowed_states: HashSet<String>,
    pub required_term: u32,
    pub min_interest_rate: Decimal,
    pub max_inquiries_last_6_mths: u32,
    /// Half-width of the loan-amount / revolving-balance band (0.10 = ±10%).
    pub revol_balance_band: Decimal,
}

/// One investor account. Mutated only by its own investment loop.
pub struct Account {
    pub id: String,
    pub name: String,
    token: SecretString,
    pub available_cash: Decimal,
    pub amount_per_loan: Decimal,
    pub criteria: InvestmentCriteria,
    /// Grows monotonically during a run.
    pub owned_loan_ids: HashSet<u64>,
    /// True until the first successful listings fetch.
    pub is_first_fetch: bool,
    /// Loans to buy per cycle, fixed at setup.
    pub target_count: usize,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        token: SecretString,
        available_cash: Decimal,
        amount_per_loan: Decimal,
        criteria: InvestmentCriteria,
        owned_loan_ids: HashSet<u64>,
    ) -> Self {
        let mut account = Self {
            id: id.into(),
            name: name.into(),
            token,
            available_cash,
            amount_per_loan,
            criteria,
            owned_loan_ids,
            is_first_fetch: true,
            target_count: 0,
        };
        account.target_count = account.investable_count();
        account
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Whether there is enough cash for at least one more note.
    pub fn can_invest(&self) -> bool {
        self.amount_per_loan > Decimal::ZERO && self.available_cash >= self.amount_per_loan
    }

    /// `floor(available_cash / amount_per_loan)`, recomputed from current cash.
    /// Saturates at `usize::MAX` when the quotient does not fit.
    pub fn investable_count(&self) -> usize {
        if self.amount_per_loan <= Decimal::ZERO || self.available_cash <= Decimal::ZERO {
            return 0;
        }
        self.available_cash
            .checked_div(self.amount_per_loan)
            .and_then(|notes| notes.floor().to_usize())
            .unwrap_or(usize::MAX)
    }

    /// Upper bound on loans selected this cycle. Shrinks as cash is spent.
    pub fn cycle_cap(&self) -> usize {
        self.investable_count().min(self.target_count)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("available_cash", &self.available_cash)
            .field("amount_per_loan", &self.amount_per_loan)
            .field("owned", &self.owned_loan_ids.len())
            .field("is_first_fetch", &self.is_first_fetch)
            .field("target_count", &self.target_count)
            .finish_non_exhaustive()
    }
}
