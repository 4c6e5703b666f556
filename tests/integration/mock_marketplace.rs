//! Mock marketplace for integration testing.
//!
//! Provides a deterministic `LendingMarketplace` implementation that serves
//! a fixed listing set, fills or rejects orders per loan, and records every
//! call. Everything stays in memory.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use autoinvest::marketplace::LendingMarketplace;
use autoinvest::types::*;

/// A mock marketplace shared by every account in a run.
///
/// Accounts are told apart by their authorization token.
#[derive(Default)]
pub struct MockMarketplace {
    listings: Vec<Loan>,
    /// Loans whose order lines come back with `investedAmount = -1`.
    rejected: HashSet<u64>,
    /// Tokens whose listing fetches fail with a transport error.
    failing_tokens: HashSet<String>,
    summaries: HashMap<String, AccountSummary>,
    fetches: Mutex<Vec<(String, bool)>>,
    orders: Mutex<Vec<(String, Order)>>,
}

impl MockMarketplace {
    pub fn with_listings(listings: Vec<Loan>) -> Self {
        Self {
            listings,
            ..Self::default()
        }
    }

    pub fn reject_loan(mut self, loan_id: u64) -> Self {
        self.rejected.insert(loan_id);
        self
    }

    pub fn fail_fetches_for(mut self, token: &str) -> Self {
        self.failing_tokens.insert(token.to_string());
        self
    }

    pub fn with_summary(mut self, account_id: &str, cash: Decimal, total: Decimal) -> Self {
        self.summaries.insert(
            account_id.to_string(),
            AccountSummary {
                investor_id: account_id.parse().ok(),
                available_cash: cash,
                account_total: total,
            },
        );
        self
    }

    /// The `show_all` flag of each listing fetch made with `token`, in call order.
    pub fn fetches_for(&self, token: &str) -> Vec<bool> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == token)
            .map(|(_, show_all)| *show_all)
            .collect()
    }

    pub fn orders_for(&self, token: &str) -> Vec<Order> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == token)
            .map(|(_, o)| o.clone())
            .collect()
    }
}

#[async_trait]
impl LendingMarketplace for MockMarketplace {
    async fn fetch_listings(&self, show_all: bool, token: &str) -> Result<Vec<Loan>, InvestError> {
        self.fetches
            .lock()
            .unwrap()
            .push((token.to_string(), show_all));

        if self.failing_tokens.contains(token) {
            return Err(InvestError::transport("fetch listings", "connection refused"));
        }
        Ok(self.listings.clone())
    }

    async fn submit_order(
        &self,
        order: &Order,
        token: &str,
    ) -> Result<OrderConfirmation, InvestError> {
        self.orders
            .lock()
            .unwrap()
            .push((token.to_string(), order.clone()));

        let order_confirmations = order
            .orders
            .iter()
            .map(|line| {
                let invested = if self.rejected.contains(&line.loan_id) {
                    dec!(-1)
                } else {
                    line.requested_amount
                };
                ConfirmationLine {
                    loan_id: line.loan_id,
                    requested_amount: Some(line.requested_amount),
                    invested_amount: Some(invested),
                    execution_status: Vec::new(),
                }
            })
            .collect();

        Ok(OrderConfirmation {
            order_instruct_id: Some(1),
            order_confirmations,
        })
    }

    async fn account_summary(
        &self,
        account_id: &str,
        _token: &str,
    ) -> Result<AccountSummary, InvestError> {
        self.summaries
            .get(account_id)
            .cloned()
            .ok_or_else(|| InvestError::transport("account summary", "404 Not Found"))
    }

    async fn owned_loan_ids(&self, _account_id: &str, _token: &str) -> Result<Vec<u64>, InvestError> {
        Ok(Vec::new())
    }
}

/// An eligible listing under the default filter policy, graded "C" in CA.
pub fn eligible_loan(id: u64, rate: Decimal) -> Loan {
    Loan {
        id,
        grade: "C".to_string(),
        int_rate: rate,
        term: 36,
        purpose: "debt_consolidation".to_string(),
        addr_state: "CA".to_string(),
        annual_inc: dec!(95000),
        mths_since_last_delinq: None,
        inq_last6_mths: 0,
        loan_amount: dec!(15000),
        revol_bal: dec!(14500),
    }
}
